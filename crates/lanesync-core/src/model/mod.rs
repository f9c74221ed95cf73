// ── Filament topology domain model ──
//
// Plain value types built from the status snapshot. Only the reconciler
// mutates them after construction.

mod lane;
mod system;
mod unit;

pub use lane::Lane;
pub use system::{AfcSystem, Buffer, Extruder, Hub};
pub use unit::Unit;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::CoreError;

/// Snapshot key of the system-wide section.
pub const SYSTEM_KEY: &str = "system";

/// The full in-memory model: system state plus every unit and its lanes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AfcModel {
    pub system: AfcSystem,
    pub units: Vec<Unit>,
}

/// A freshly built model plus what had to be skipped to build it.
#[derive(Debug)]
pub struct BuiltModel {
    pub model: AfcModel,
    pub diagnostics: Vec<CoreError>,
}

impl AfcModel {
    /// Build the model from a full snapshot. Never fails: malformed units
    /// and lanes are skipped and reported in `diagnostics`.
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> BuiltModel {
        let mut diagnostics = Vec::new();

        let system = match snapshot.get(SYSTEM_KEY) {
            Some(Value::Object(section)) => AfcSystem::from_snapshot(section, &mut diagnostics),
            Some(_) => {
                warn!("system section is not a mapping, using defaults");
                diagnostics.push(CoreError::malformed(SYSTEM_KEY, "not a mapping"));
                AfcSystem::default()
            }
            None => AfcSystem::default(),
        };

        let mut units = Vec::new();
        for (name, value) in snapshot {
            if name == SYSTEM_KEY {
                continue;
            }
            match value.as_object() {
                Some(entry) => units.push(Unit::from_snapshot(name, entry, &mut diagnostics)),
                None => {
                    warn!(unit = %name, "unit entry is not a mapping, skipping");
                    diagnostics.push(CoreError::malformed(name.as_str(), "not a mapping"));
                }
            }
        }

        BuiltModel {
            model: Self { system, units },
            diagnostics,
        }
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.units.iter().flat_map(|u| u.lanes.iter())
    }

    pub fn lane(&self, name: &str) -> Option<&Lane> {
        self.lanes().find(|l| l.name == name)
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// The lane named by `current_load` together with its unit.
    pub fn current_lane(&self) -> Option<(&Unit, &Lane)> {
        let current = self.system.current_load.as_deref()?;
        self.units
            .iter()
            .find_map(|u| u.lane(current).map(|l| (u, l)))
    }
}
