// ── Lane domain type ──

use serde::Serialize;
use serde_json::{Map, Value};

use crate::convert::{opt_f64, opt_i64, opt_text, round_weight, truthy};
use crate::error::CoreError;
use crate::status::{LaneStatus, derive_status_with_raw};

/// One filament feed path, owned by a unit.
///
/// `status` is private: it is only ever derived from `prep`, `load`,
/// `tool_loaded` and the host's raw status text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    pub name: String,
    pub unit: String,
    pub hub: Option<String>,
    pub extruder: Option<String>,
    pub buffer: Option<String>,
    pub buffer_status: Option<String>,
    /// Position within the unit, as numbered by the host.
    pub index: i64,
    /// Operator-assigned slot alias, e.g. `T0`.
    pub map: Option<String>,
    pub load: bool,
    pub prep: bool,
    pub tool_loaded: bool,
    pub loaded_to_hub: bool,
    pub material: Option<String>,
    pub spool_id: i64,
    pub color: Option<String>,
    /// Grams, rounded.
    pub weight: u32,
    pub extruder_temp: Option<f64>,
    pub runout_lane: Option<String>,
    /// Free-form status text from the host (e.g. `Tool Loading`).
    pub raw_status: Option<String>,
    status: LaneStatus,
}

impl Lane {
    /// An empty lane: all sensors clear, no spool data.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            hub: None,
            extruder: None,
            buffer: None,
            buffer_status: None,
            index: 0,
            map: None,
            load: false,
            prep: false,
            tool_loaded: false,
            loaded_to_hub: false,
            material: None,
            spool_id: 0,
            color: None,
            weight: 0,
            extruder_temp: None,
            runout_lane: None,
            raw_status: None,
            status: LaneStatus::Unloaded,
        }
    }

    /// Build a lane from its snapshot entry; missing fields take defaults.
    pub fn from_snapshot(
        name: impl Into<String>,
        unit: impl Into<String>,
        entry: &Map<String, Value>,
    ) -> Result<Self, CoreError> {
        Self::new(name, unit).merged(entry)
    }

    pub fn status(&self) -> LaneStatus {
        self.status
    }

    /// This lane with `entry` applied on top.
    ///
    /// Keys missing from `entry` keep their current value; explicit nulls
    /// clear optional fields. Fails without side effects when a field has a
    /// type that cannot be coerced.
    pub fn merged(&self, entry: &Map<String, Value>) -> Result<Self, CoreError> {
        let fields = Fields {
            lane: &self.name,
            entry,
        };

        let mut next = Self {
            name: self.name.clone(),
            unit: self.unit.clone(),
            hub: fields.text("hub", self.hub.as_ref())?,
            extruder: fields.text("extruder", self.extruder.as_ref())?,
            buffer: fields.text("buffer", self.buffer.as_ref())?,
            buffer_status: fields.text("buffer_status", self.buffer_status.as_ref())?,
            index: fields.integer("lane")?.map_or(self.index, Option::unwrap_or_default),
            map: fields.text("map", self.map.as_ref())?,
            load: fields.flag("load", self.load),
            prep: fields.flag("prep", self.prep),
            tool_loaded: fields.flag("tool_loaded", self.tool_loaded),
            loaded_to_hub: fields.flag("loaded_to_hub", self.loaded_to_hub),
            material: fields.text("material", self.material.as_ref())?,
            spool_id: fields
                .integer("spool_id")?
                .map_or(self.spool_id, Option::unwrap_or_default),
            color: fields.text("color", self.color.as_ref())?,
            weight: fields
                .number("weight")?
                .map_or(self.weight, |w| round_weight(w.unwrap_or_default())),
            extruder_temp: fields
                .number("extruder_temp")?
                .map_or(self.extruder_temp, |t| t.filter(|t| t.is_finite())),
            runout_lane: fields.text("runout_lane", self.runout_lane.as_ref())?,
            raw_status: fields.text("status", self.raw_status.as_ref())?,
            status: self.status,
        };
        next.status = derive_status_with_raw(
            next.prep,
            next.load,
            next.tool_loaded,
            next.raw_status.as_deref(),
        );
        Ok(next)
    }

    /// Color as `#rrggbb`-style text for display, if any.
    pub fn display_color(&self) -> Option<String> {
        self.color.as_ref().map(|c| {
            if c.starts_with('#') {
                c.clone()
            } else {
                format!("#{c}")
            }
        })
    }
}

/// Typed field readers over one snapshot entry.
///
/// Outer `Option` is key presence, inner is null-ness.
struct Fields<'a> {
    lane: &'a str,
    entry: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn flag(&self, key: &str, current: bool) -> bool {
        self.entry.get(key).map_or(current, truthy)
    }

    fn text(&self, key: &str, current: Option<&String>) -> Result<Option<String>, CoreError> {
        match self.entry.get(key) {
            None => Ok(current.cloned()),
            Some(Value::Array(_) | Value::Object(_)) => Err(self.wrong_type(key, "a string")),
            Some(value) => Ok(opt_text(value)),
        }
    }

    fn number(&self, key: &str) -> Result<Option<Option<f64>>, CoreError> {
        match self.entry.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Some(None)),
            Some(value) => opt_f64(value)
                .map(|n| Some(Some(n)))
                .ok_or_else(|| self.wrong_type(key, "a number")),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<Option<i64>>, CoreError> {
        match self.entry.get(key) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Some(None)),
            Some(value) => opt_i64(value)
                .map(|n| Some(Some(n)))
                .ok_or_else(|| self.wrong_type(key, "an integer")),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str) -> CoreError {
        CoreError::malformed(format!("lane {}", self.lane), format!("{key} is not {expected}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn defaults_for_missing_fields() {
        let lane = Lane::from_snapshot("lane1", "Turtle_1", &Map::new()).unwrap();
        assert!(!lane.load && !lane.prep && !lane.tool_loaded && !lane.loaded_to_hub);
        assert_eq!(lane.weight, 0);
        assert_eq!(lane.spool_id, 0);
        assert_eq!(lane.status(), LaneStatus::Unloaded);
    }

    #[test]
    fn builds_full_entry() {
        let lane = Lane::from_snapshot(
            "lane1",
            "Turtle_1",
            &entry(json!({
                "hub": "Turtle_1",
                "extruder": "extruder",
                "lane": 1,
                "map": "T0",
                "prep": true,
                "load": true,
                "tool_loaded": false,
                "material": "PLA",
                "spool_id": "",
                "color": "#ff0000",
                "weight": 699.5,
                "extruder_temp": 215,
                "runout_lane": null,
                "status": "Loaded"
            })),
        )
        .unwrap();

        assert_eq!(lane.status(), LaneStatus::Loaded);
        assert_eq!(lane.weight, 700);
        assert_eq!(lane.spool_id, 0);
        assert_eq!(lane.map.as_deref(), Some("T0"));
        assert_eq!(lane.index, 1);
        assert!(lane.runout_lane.is_none());
        assert_eq!(lane.extruder_temp, Some(215.0));
    }

    #[test]
    fn negative_weight_clamps_to_zero() {
        let lane =
            Lane::from_snapshot("lane1", "u", &entry(json!({ "weight": -5 }))).unwrap();
        assert_eq!(lane.weight, 0);
    }

    #[test]
    fn merge_keeps_absent_and_clears_null() {
        let lane = Lane::from_snapshot(
            "lane1",
            "u",
            &entry(json!({ "material": "PETG", "map": "T1", "weight": 500 })),
        )
        .unwrap();

        let next = lane.merged(&entry(json!({ "map": null }))).unwrap();
        assert_eq!(next.material.as_deref(), Some("PETG"));
        assert_eq!(next.weight, 500);
        assert!(next.map.is_none());
    }

    #[test]
    fn wrong_typed_field_is_an_error() {
        let lane = Lane::new("lane1", "u");
        let err = lane
            .merged(&entry(json!({ "weight": "heavy" })))
            .unwrap_err();
        assert!(matches!(err, CoreError::MalformedSnapshot { .. }));

        assert!(lane.merged(&entry(json!({ "material": ["PLA"] }))).is_err());
    }

    #[test]
    fn display_color_adds_hash() {
        let mut lane = Lane::new("lane1", "u");
        lane.color = Some("00ff00".into());
        assert_eq!(lane.display_color().as_deref(), Some("#00ff00"));
    }
}
