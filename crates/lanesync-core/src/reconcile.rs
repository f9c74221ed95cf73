// ── Snapshot reconciliation ──
//
// Applies a fresh status snapshot to the in-memory model in place and
// decides which presentation intents the changes require.
//
// Lanes always re-derive their status; hubs are compared against a
// last-known-state table and stay silent when unchanged. Hub dots are
// cosmetic, whereas a lane's status also gates which actions are offered.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::convert::{opt_i64, opt_text, truthy};
use crate::error::CoreError;
use crate::intent::{Intent, LaneField};
use crate::model::{AfcModel, AfcSystem, Hub, Lane, SYSTEM_KEY};
use crate::status::highlight_transition;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Intents in emission order.
    pub intents: Vec<Intent>,
    /// Cached auxiliary statuses no longer apply.
    pub invalidate_aux: bool,
    /// Known lanes with no entry in this snapshot.
    pub stale_lanes: Vec<String>,
    /// Sections skipped because they were malformed.
    pub diagnostics: Vec<CoreError>,
}

/// Stateful diff engine. Holds the hub last-known-state table.
#[derive(Debug, Default)]
pub struct Reconciler {
    hub_states: HashMap<String, bool>,
}

impl Reconciler {
    /// Seed the hub table from an already-rendered model.
    pub fn new(model: &AfcModel) -> Self {
        Self {
            hub_states: model
                .system
                .hubs
                .iter()
                .map(|(name, hub)| (name.clone(), hub.state))
                .collect(),
        }
    }

    /// Apply `snapshot` to `model` and collect the resulting intents.
    pub fn reconcile(&mut self, model: &mut AfcModel, snapshot: &Map<String, Value>) -> Reconciliation {
        let mut out = Reconciliation::default();

        match snapshot.get(SYSTEM_KEY) {
            Some(Value::Object(section)) => {
                reconcile_system(&mut model.system, section, &mut out);
                self.reconcile_hubs(&mut model.system, section, &mut out);
            }
            Some(_) => {
                warn!("system section is not a mapping, skipping");
                out.diagnostics
                    .push(CoreError::malformed(SYSTEM_KEY, "not a mapping"));
            }
            None => debug!("snapshot has no system section"),
        }

        let current_load = model.system.current_load.clone();
        for unit in &mut model.units {
            let unit_entry = match snapshot.get(&unit.name) {
                Some(Value::Object(entry)) => entry,
                Some(_) => {
                    warn!(unit = %unit.name, "unit entry is not a mapping, skipping");
                    out.diagnostics
                        .push(CoreError::malformed(unit.name.as_str(), "not a mapping"));
                    continue;
                }
                None => {
                    warn!(unit = %unit.name, "unit missing from snapshot");
                    out.stale_lanes.extend(unit.lanes.iter().map(|l| l.name.clone()));
                    continue;
                }
            };

            for lane in &mut unit.lanes {
                let entry = match unit_entry.get(&lane.name) {
                    Some(Value::Object(entry)) => entry,
                    None | Some(Value::Null) => {
                        warn!(lane = %lane.name, "no data for lane");
                        out.stale_lanes.push(lane.name.clone());
                        continue;
                    }
                    Some(_) => {
                        warn!(lane = %lane.name, "lane entry is not a mapping, skipping");
                        out.diagnostics.push(CoreError::malformed(
                            format!("{}.{}", unit.name, lane.name),
                            "not a mapping",
                        ));
                        continue;
                    }
                };

                let is_current = current_load.as_deref() == Some(lane.name.as_str());
                if let Err(e) = reconcile_lane(lane, entry, is_current, &mut out) {
                    warn!(lane = %lane.name, error = %e, "lane update failed, keeping previous state");
                    out.diagnostics.push(e);
                }
            }
        }

        out
    }

    fn reconcile_hubs(
        &mut self,
        system: &mut AfcSystem,
        section: &Map<String, Value>,
        out: &mut Reconciliation,
    ) {
        let Some(hubs) = section.get("hubs").and_then(Value::as_object) else {
            return;
        };
        for (name, value) in hubs {
            let Some(entry) = value.as_object() else {
                warn!(hub = %name, "hub entry is not a mapping, skipping");
                out.diagnostics
                    .push(CoreError::malformed(format!("hub {name}"), "not a mapping"));
                continue;
            };
            let Some(state) = entry.get("state").map(truthy) else {
                continue;
            };
            match system.hubs.get_mut(name) {
                Some(hub) => hub.state = state,
                None => {
                    debug!(hub = %name, "hub appeared after connect");
                    system.hubs.insert(
                        name.clone(),
                        Hub {
                            state,
                            ..Hub::default()
                        },
                    );
                }
            }
            if self.hub_states.get(name) == Some(&state) {
                continue;
            }
            self.hub_states.insert(name.clone(), state);
            out.intents.push(Intent::UpdateHubState {
                hub: name.clone(),
                active: state,
            });
        }
    }
}

// ── System fields ────────────────────────────────────────────────────

fn reconcile_system(system: &mut AfcSystem, section: &Map<String, Value>, out: &mut Reconciliation) {
    if let Some(raw) = section.get("current_load") {
        let current = opt_text(raw);
        if current != system.current_load {
            info!(from = ?system.current_load, to = ?current, "current lane changed");
            system.current_load = current;
            out.invalidate_aux = true;
            out.intents.push(Intent::UpdateSystemSummary);
        }
    }

    let current = section
        .get("current_toolchange")
        .and_then(opt_i64)
        .unwrap_or(system.current_toolchange);
    let total = section
        .get("number_of_toolchanges")
        .and_then(opt_i64)
        .unwrap_or(system.number_of_toolchanges);
    if (current, total) != (system.current_toolchange, system.number_of_toolchanges) {
        system.current_toolchange = current;
        system.number_of_toolchanges = total;
        out.intents.push(Intent::UpdateToolchange { current, total });
    }

    if let Some(led) = section.get("led_state").map(truthy) {
        if led != system.led_state {
            system.led_state = led;
            out.intents.push(Intent::UpdateLedState { on: led });
        }
    }

    if let Some(spoolman) = section.get("spoolman") {
        system.spoolman = opt_text(spoolman);
    }

    // Only `lane_loaded` moves during a session.
    if let Some(extruders) = section.get("extruders").and_then(Value::as_object) {
        for (name, extruder) in &mut system.extruders {
            if let Some(raw) = extruders.get(name).and_then(|e| e.get("lane_loaded")) {
                extruder.lane_loaded = opt_text(raw);
            }
        }
    }

    if let Some(buffers) = section.get("buffers").and_then(Value::as_object) {
        for (name, buffer) in &mut system.buffers {
            if let Some(raw) = buffers.get(name).and_then(|b| b.get("state")) {
                buffer.state = truthy(raw);
            }
        }
    }
}

// ── Lanes ────────────────────────────────────────────────────────────

fn reconcile_lane(
    lane: &mut Lane,
    entry: &Map<String, Value>,
    is_current: bool,
    out: &mut Reconciliation,
) -> Result<(), CoreError> {
    let next = lane.merged(entry)?;
    let name = &lane.name;

    let old_status = lane.status();
    let new_status = next.status();
    if new_status != old_status {
        debug!(lane = %name, from = %old_status, to = %new_status, "lane status changed");
        if let Some(highlighted) = highlight_transition(old_status, new_status) {
            out.intents.push(Intent::SetLaneHighlight {
                lane: name.clone(),
                highlighted,
            });
        }
        out.intents.push(Intent::RebuildLaneView {
            lane: name.clone(),
            status: new_status,
        });
        out.intents.push(Intent::RecolorLaneStatus {
            lane: name.clone(),
            status: new_status,
        });
    }

    let changed = [
        (LaneField::Map, lane.map != next.map),
        (LaneField::RunoutLane, lane.runout_lane != next.runout_lane),
        (LaneField::Material, lane.material != next.material),
        (LaneField::Weight, lane.weight != next.weight),
        (LaneField::Color, lane.color != next.color),
        (LaneField::Load, lane.load != next.load),
        (LaneField::Buffer, lane.buffer != next.buffer),
        (LaneField::BufferStatus, lane.buffer_status != next.buffer_status),
    ];
    for (field, _) in changed.iter().filter(|(_, differs)| *differs) {
        out.intents.push(Intent::UpdateLaneField {
            lane: name.clone(),
            field: *field,
        });
    }

    let summary_fields = [LaneField::Map, LaneField::Buffer, LaneField::BufferStatus];
    let summary_changed = changed
        .iter()
        .any(|(field, differs)| *differs && summary_fields.contains(field))
        || lane.extruder != next.extruder;
    if is_current && summary_changed {
        out.intents.push(Intent::UpdateSystemSummary);
    }
    // A remapped lane may now bind to a different aggregator group.
    if lane.map != next.map {
        out.invalidate_aux = true;
    }

    *lane = next;
    Ok(())
}
