// ── System-wide domain types ──

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::convert::{de_bool, de_f64, de_opt_string, de_string_list, opt_i64, opt_text, truthy};
use crate::error::CoreError;

/// Singleton session state taken from the `"system"` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AfcSystem {
    /// Lane currently feeding the toolhead.
    pub current_load: Option<String>,
    pub num_units: u32,
    pub num_lanes: u32,
    pub num_extruders: u32,
    /// Spool database integration; `None` when not configured.
    pub spoolman: Option<String>,
    pub current_toolchange: i64,
    pub number_of_toolchanges: i64,
    pub led_state: bool,
    pub extruders: IndexMap<String, Extruder>,
    pub hubs: IndexMap<String, Hub>,
    pub buffers: IndexMap<String, Buffer>,
}

/// Toolhead configuration. Only `lane_loaded` changes during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extruder {
    #[serde(deserialize_with = "de_opt_string")]
    pub lane_loaded: Option<String>,
    #[serde(deserialize_with = "de_f64")]
    pub tool_stn: f64,
    #[serde(deserialize_with = "de_f64")]
    pub tool_stn_unload: f64,
    #[serde(deserialize_with = "de_f64")]
    pub tool_sensor_after_extruder: f64,
    #[serde(deserialize_with = "de_f64")]
    pub tool_unload_speed: f64,
    #[serde(deserialize_with = "de_f64")]
    pub tool_load_speed: f64,
    #[serde(deserialize_with = "de_opt_string")]
    pub buffer: Option<String>,
    #[serde(deserialize_with = "de_opt_string")]
    pub tool_start: Option<String>,
    #[serde(deserialize_with = "de_bool")]
    pub tool_start_status: bool,
    #[serde(deserialize_with = "de_opt_string")]
    pub tool_end: Option<String>,
    #[serde(deserialize_with = "de_bool")]
    pub tool_end_status: bool,
    #[serde(deserialize_with = "de_string_list")]
    pub lanes: Vec<String>,
}

/// Shared junction, optionally with a filament cutter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hub {
    /// Filament present at the hub sensor.
    #[serde(deserialize_with = "de_bool")]
    pub state: bool,
    #[serde(deserialize_with = "de_bool")]
    pub cut: bool,
    #[serde(deserialize_with = "de_opt_string")]
    pub cut_cmd: Option<String>,
    #[serde(deserialize_with = "de_f64")]
    pub cut_dist: f64,
    #[serde(deserialize_with = "de_f64")]
    pub cut_clear: f64,
    #[serde(deserialize_with = "de_f64")]
    pub cut_min_length: f64,
    #[serde(deserialize_with = "de_f64")]
    pub cut_servo_pass_angle: f64,
    #[serde(deserialize_with = "de_f64")]
    pub cut_servo_clip_angle: f64,
    #[serde(deserialize_with = "de_f64")]
    pub cut_servo_prep_angle: f64,
    #[serde(deserialize_with = "de_string_list")]
    pub lanes: Vec<String>,
    #[serde(deserialize_with = "de_f64")]
    pub afc_bowden_length: f64,
}

/// Slack accumulator between lanes and a toolhead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buffer {
    #[serde(deserialize_with = "de_bool")]
    pub state: bool,
    #[serde(deserialize_with = "de_string_list")]
    pub lanes: Vec<String>,
    #[serde(deserialize_with = "de_bool")]
    pub enabled: bool,
    #[serde(deserialize_with = "de_opt_string")]
    pub belay: Option<String>,
}

impl AfcSystem {
    /// Build the system from its snapshot section.
    ///
    /// Extruder, hub and buffer entries that are not mappings are skipped
    /// and reported in `diagnostics`.
    pub fn from_snapshot(section: &Map<String, Value>, diagnostics: &mut Vec<CoreError>) -> Self {
        let count = |key: &str| {
            section
                .get(key)
                .and_then(opt_i64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or_default()
        };
        Self {
            current_load: section.get("current_load").and_then(opt_text),
            num_units: count("num_units"),
            num_lanes: count("num_lanes"),
            num_extruders: count("num_extruders"),
            spoolman: section.get("spoolman").and_then(opt_text),
            current_toolchange: section
                .get("current_toolchange")
                .and_then(opt_i64)
                .unwrap_or_default(),
            number_of_toolchanges: section
                .get("number_of_toolchanges")
                .and_then(opt_i64)
                .unwrap_or_default(),
            led_state: section.get("led_state").is_some_and(truthy),
            extruders: named_entries(section, "extruders", diagnostics),
            hubs: named_entries(section, "hubs", diagnostics),
            buffers: named_entries(section, "buffers", diagnostics),
        }
    }
}

/// Deserialize every `{name: {...}}` entry of `section[key]`.
fn named_entries<T>(
    section: &Map<String, Value>,
    key: &str,
    diagnostics: &mut Vec<CoreError>,
) -> IndexMap<String, T>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(entries) = section.get(key) else {
        return IndexMap::new();
    };
    let Some(entries) = entries.as_object() else {
        warn!(section = key, "system section is not a mapping, ignoring");
        diagnostics.push(CoreError::malformed(format!("system.{key}"), "not a mapping"));
        return IndexMap::new();
    };

    let mut out = IndexMap::with_capacity(entries.len());
    for (name, value) in entries {
        if !value.is_object() {
            warn!(section = key, name = %name, "entry is not a mapping, skipping");
            diagnostics.push(CoreError::malformed(
                format!("system.{key}.{name}"),
                "not a mapping",
            ));
            continue;
        }
        match T::deserialize(value) {
            Ok(entity) => {
                out.insert(name.clone(), entity);
            }
            Err(e) => {
                warn!(section = key, name = %name, error = %e, "entry skipped");
                diagnostics.push(CoreError::malformed(format!("system.{key}.{name}"), e.to_string()));
            }
        }
    }
    out
}
