// ── Outbound command API ──
//
// Every write to the filament changer is a single-line directive with
// `KEY=value` parameters. Delivery is fire-and-forget: success means the
// host accepted the script, nothing more.

use serde::Serialize;

use crate::error::CoreError;

/// All directives the controller can send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    // ── Tool changes ─────────────────────────────────────────────────
    /// Load `lane` into the toolhead.
    ChangeTool { lane: String },
    /// Unload whatever is in the toolhead.
    UnloadTool,
    /// Eject `lane` back to its spool.
    EjectLane { lane: String },
    /// Mark `lane` as loaded without moving filament.
    SetLaneLoaded { lane: String },
    UnsetLaneLoaded,

    // ── Lane configuration ───────────────────────────────────────────
    SetMap { lane: String, map: String },
    /// `runout` is a lane name, or `NONE` to clear.
    SetRunout { lane: String, runout: String },
    SetMaterial { lane: String, material: String },
    /// Hex color, with or without a leading `#`.
    SetColor { lane: String, color: String },
    SetWeight { lane: String, weight: u32 },
    /// `None` detaches the spool record.
    SetSpoolId { lane: String, spool_id: Option<u32> },

    // ── Maintenance ──────────────────────────────────────────────────
    /// Move filament by `distance` mm; negative retracts.
    MoveLane { lane: String, distance: f64 },
    TestLane { lane: String },
    Calibrate,
    SetLed { on: bool },
    SetVirtualBypass { enabled: bool },
}

impl Command {
    /// Validate and render the directive.
    pub fn script(&self) -> Result<String, CoreError> {
        self.validate()?;
        Ok(self.render())
    }

    /// Lane the directive targets, if any.
    pub fn lane(&self) -> Option<&str> {
        match self {
            Self::ChangeTool { lane }
            | Self::EjectLane { lane }
            | Self::SetLaneLoaded { lane }
            | Self::SetMap { lane, .. }
            | Self::SetRunout { lane, .. }
            | Self::SetMaterial { lane, .. }
            | Self::SetColor { lane, .. }
            | Self::SetWeight { lane, .. }
            | Self::SetSpoolId { lane, .. }
            | Self::MoveLane { lane, .. }
            | Self::TestLane { lane } => Some(lane),
            Self::UnloadTool
            | Self::UnsetLaneLoaded
            | Self::Calibrate
            | Self::SetLed { .. }
            | Self::SetVirtualBypass { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if let Some(lane) = self.lane() {
            param("lane", lane)?;
        }
        match self {
            Self::SetMap { map, .. } => param("map", map),
            Self::SetRunout { runout, .. } => param("runout", runout),
            Self::SetMaterial { material, .. } => param("material", material),
            Self::SetColor { color, .. } => {
                let hex = color.trim_start_matches('#');
                if matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    Ok(())
                } else {
                    Err(invalid(format!("color must be 6 or 8 hex digits, got '{color}'")))
                }
            }
            Self::MoveLane { distance, .. } if !distance.is_finite() || distance.abs() < f64::EPSILON => {
                Err(invalid("move distance must be a non-zero number"))
            }
            _ => Ok(()),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::ChangeTool { lane } => format!("CHANGE_TOOL LANE={lane}"),
            Self::UnloadTool => "TOOL_UNLOAD".into(),
            Self::EjectLane { lane } => format!("LANE_UNLOAD LANE={lane}"),
            Self::SetLaneLoaded { lane } => format!("SET_LANE_LOADED LANE={lane}"),
            Self::UnsetLaneLoaded => "UNSET_LANE_LOADED".into(),
            Self::SetMap { lane, map } => format!("SET_MAP LANE={lane} MAP={map}"),
            Self::SetRunout { lane, runout } => format!("SET_RUNOUT LANE={lane} RUNOUT={runout}"),
            Self::SetMaterial { lane, material } => {
                format!("SET_MATERIAL LANE={lane} MATERIAL={}", material.to_uppercase())
            }
            Self::SetColor { lane, color } => {
                format!("SET_COLOR LANE={lane} COLOR={}", color.trim_start_matches('#'))
            }
            Self::SetWeight { lane, weight } => format!("SET_WEIGHT LANE={lane} WEIGHT={weight}"),
            Self::SetSpoolId { lane, spool_id } => match spool_id {
                Some(id) => format!("SET_SPOOL_ID LANE={lane} SPOOL_ID={id}"),
                None => format!("SET_SPOOL_ID LANE={lane} SPOOL_ID=\"\""),
            },
            Self::MoveLane { lane, distance } => format!("LANE_MOVE LANE={lane} DISTANCE={distance}"),
            Self::TestLane { lane } => format!("TEST LANE={lane}"),
            Self::Calibrate => "AFC_CALIBRATION".into(),
            Self::SetLed { on: true } => "TURN_ON_AFC_LED".into(),
            Self::SetLed { on: false } => "TURN_OFF_AFC_LED".into(),
            Self::SetVirtualBypass { enabled } => format!(
                "SET_FILAMENT_SENSOR SENSOR=virtual_bypass ENABLE={}",
                u8::from(*enabled)
            ),
        }
    }
}

/// A parameter value must be a single non-empty token.
fn param(name: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(invalid(format!("{name} must not be empty")));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control() || c == '=') {
        return Err(invalid(format!("{name} '{}' contains whitespace or '='", value.escape_debug())));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ValidationFailed {
        message: message.into(),
    }
}
