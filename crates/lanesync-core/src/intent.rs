// ── Presentation intents ──
//
// What the presentation layer must redraw after a snapshot. Emitted in
// order: system, hubs, then per lane (status, fields, summary).

use serde::Serialize;
use strum::Display;

use crate::status::LaneStatus;

/// Lane attribute with its own narrow update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LaneField {
    Map,
    RunoutLane,
    Material,
    Weight,
    Color,
    Load,
    Buffer,
    BufferStatus,
}

/// One unit of work for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    // ── System ──────────────────────────────────────────────────────
    /// Recompute the "currently loaded" summary.
    UpdateSystemSummary,
    UpdateToolchange { current: i64, total: i64 },
    UpdateLedState { on: bool },
    UpdateHubState { hub: String, active: bool },

    // ── Lanes ───────────────────────────────────────────────────────
    SetLaneHighlight { lane: String, highlighted: bool },
    /// Replace the lane's view. Delivered after the rebuild debounce.
    RebuildLaneView { lane: String, status: LaneStatus },
    RecolorLaneStatus { lane: String, status: LaneStatus },
    UpdateLaneField { lane: String, field: LaneField },

    // ── Sensors ─────────────────────────────────────────────────────
    UpdateSensor { sensor: String, detected: bool },
    UpdateVirtualBypass { enabled: bool },
}

impl Intent {
    /// Lane this intent targets, if any.
    pub fn lane(&self) -> Option<&str> {
        match self {
            Self::SetLaneHighlight { lane, .. }
            | Self::RebuildLaneView { lane, .. }
            | Self::RecolorLaneStatus { lane, .. }
            | Self::UpdateLaneField { lane, .. } => Some(lane),
            _ => None,
        }
    }

    pub fn is_rebuild(&self) -> bool {
        matches!(self, Self::RebuildLaneView { .. })
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateSystemSummary => f.write_str("summary"),
            Self::UpdateToolchange { current, total } => {
                write!(f, "toolchange {current}/{total}")
            }
            Self::UpdateLedState { on } => write!(f, "led {}", if *on { "on" } else { "off" }),
            Self::UpdateHubState { hub, active } => write!(f, "hub {hub} active={active}"),
            Self::SetLaneHighlight { lane, highlighted } => {
                write!(f, "{lane} highlight={highlighted}")
            }
            Self::RebuildLaneView { lane, status } => write!(f, "{lane} rebuild ({status})"),
            Self::RecolorLaneStatus { lane, status } => write!(f, "{lane} status {status}"),
            Self::UpdateLaneField { lane, field } => write!(f, "{lane} {field}"),
            Self::UpdateSensor { sensor, detected } => {
                write!(f, "sensor {sensor} detected={detected}")
            }
            Self::UpdateVirtualBypass { enabled } => write!(f, "virtual bypass enabled={enabled}"),
        }
    }
}
