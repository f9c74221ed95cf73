// ── Feeder unit domain type ──

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::lane::Lane;
use crate::convert::{opt_text, string_list};
use crate::error::CoreError;

/// Key of the per-unit metadata block inside a unit entry.
pub(crate) const UNIT_SYSTEM_KEY: &str = "system";

/// Type-tag marker of units fed through the aggregator subsystem.
const AGGREGATOR_MARKER: &str = "AMS";

/// One physical filament-feeding device. Owns its lanes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub name: String,
    /// Hardware family tag reported by the host (e.g. `Box_Turtle`).
    pub system_type: String,
    pub lanes: Vec<Lane>,
    /// Hubs referenced by this unit's lanes (not owned).
    pub hubs: Vec<String>,
}

impl Unit {
    /// Build a unit and its lanes. Lane entries that are not mappings or
    /// carry uncoercible fields are skipped and reported in `diagnostics`.
    pub fn from_snapshot(
        name: &str,
        entry: &Map<String, Value>,
        diagnostics: &mut Vec<CoreError>,
    ) -> Self {
        let meta = entry.get(UNIT_SYSTEM_KEY).and_then(Value::as_object);
        let system_type = meta
            .and_then(|m| m.get("type"))
            .and_then(opt_text)
            .unwrap_or_else(|| "Unknown".into());

        let mut lanes = Vec::new();
        for (lane_name, value) in entry {
            if lane_name == UNIT_SYSTEM_KEY {
                continue;
            }
            let Some(lane_entry) = value.as_object() else {
                warn!(unit = name, lane = %lane_name, "lane entry is not a mapping, skipping");
                diagnostics.push(CoreError::malformed(
                    format!("{name}.{lane_name}"),
                    "not a mapping",
                ));
                continue;
            };
            match Lane::from_snapshot(lane_name.as_str(), name, lane_entry) {
                Ok(lane) => lanes.push(lane),
                Err(e) => {
                    warn!(unit = name, lane = %lane_name, error = %e, "lane skipped");
                    diagnostics.push(e);
                }
            }
        }
        lanes.sort_by_key(|lane| lane.index);

        let mut hubs = meta
            .and_then(|m| m.get("hubs"))
            .map(string_list)
            .unwrap_or_default();
        if hubs.is_empty() {
            for hub in lanes.iter().filter_map(|l| l.hub.as_ref()) {
                if !hubs.contains(hub) {
                    hubs.push(hub.clone());
                }
            }
        }

        Self {
            name: name.to_owned(),
            system_type,
            lanes,
            hubs,
        }
    }

    /// Whether this unit's lanes report through the aggregator subsystem.
    pub fn uses_aggregator(&self) -> bool {
        self.system_type.to_uppercase().contains(AGGREGATOR_MARKER)
            || self.name.to_uppercase().contains(AGGREGATOR_MARKER)
    }

    pub fn lane(&self, name: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.name == name)
    }

    pub fn lane_names(&self) -> impl Iterator<Item = &str> {
        self.lanes.iter().map(|l| l.name.as_str())
    }
}
