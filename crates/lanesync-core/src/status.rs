// ── Lane status derivation ──
//
// Pure mapping from a lane's raw sensor booleans (plus an optional raw
// status string) to a closed set of statuses, and from statuses to the
// style tokens the presentation layer renders.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Canonical lane status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LaneStatus {
    /// Filament is in the toolhead.
    Tooled,
    /// Staged at the lane and ready to feed.
    Loaded,
    PrepNotLoad,
    LoadNotPrep,
    Unloaded,
    /// Tool change in progress toward this lane.
    Loading,
    /// Tool change in progress away from this lane.
    Unloading,
}

/// Coarse grouping used for highlight and availability decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCategory {
    Unready,
    Ready,
}

impl LaneStatus {
    pub fn category(self) -> StatusCategory {
        match self {
            Self::Unloaded | Self::PrepNotLoad | Self::LoadNotPrep => StatusCategory::Unready,
            Self::Loaded | Self::Tooled | Self::Loading | Self::Unloading => StatusCategory::Ready,
        }
    }

    /// Whether this is one of the tool-change sub-states.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Loading | Self::Unloading)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Style tokens for this status, most significant first.
    pub fn style_tokens(self) -> &'static [StyleToken] {
        match self {
            Self::Tooled => &[StyleToken::StatusTooled, StyleToken::BoldText],
            Self::Loaded | Self::Loading | Self::Unloading => &[StyleToken::StatusLoaded],
            Self::PrepNotLoad | Self::LoadNotPrep => &[StyleToken::StatusWarning],
            Self::Unloaded => &[StyleToken::StatusLaneEmpty],
        }
    }
}

/// Derive a base status from sensor booleans.
///
/// Precedence: `tool_loaded`, then `prep && load`, then either one alone.
pub fn derive_status(prep: bool, load: bool, tool_loaded: bool) -> LaneStatus {
    match (prep, load, tool_loaded) {
        (_, _, true) => LaneStatus::Tooled,
        (true, true, false) => LaneStatus::Loaded,
        (true, false, false) => LaneStatus::PrepNotLoad,
        (false, true, false) => LaneStatus::LoadNotPrep,
        (false, false, false) => LaneStatus::Unloaded,
    }
}

/// Derive a status, refining `loaded`/`tooled` into the tool-change
/// sub-states when the host reports one in `raw`.
pub fn derive_status_with_raw(
    prep: bool,
    load: bool,
    tool_loaded: bool,
    raw: Option<&str>,
) -> LaneStatus {
    let base = derive_status(prep, load, tool_loaded);
    if !matches!(base, LaneStatus::Loaded | LaneStatus::Tooled) {
        return base;
    }
    match raw.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("tool loading") => LaneStatus::Loading,
        Some(s) if s.eq_ignore_ascii_case("tool unloading") => LaneStatus::Unloading,
        _ => base,
    }
}

/// Highlight change implied by a status transition.
///
/// `Some(true)` when the lane becomes the active one, `Some(false)` when a
/// tool change away from it completes, `None` to leave styling alone.
pub fn highlight_transition(old: LaneStatus, new: LaneStatus) -> Option<bool> {
    match (old, new) {
        (LaneStatus::Unloading | LaneStatus::Tooled, LaneStatus::Loaded) => Some(false),
        (_, LaneStatus::Loading | LaneStatus::Tooled) => Some(true),
        _ => None,
    }
}

// ── Style tokens ─────────────────────────────────────────────────────

/// Presentation style token, resolved from a status as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StyleToken {
    StatusTooled,
    BoldText,
    StatusLoaded,
    StatusWarning,
    StatusLaneEmpty,
    /// Hub or sensor dot with filament present.
    StatusActive,
    /// Hub or sensor dot without filament.
    StatusEmpty,
}

impl StyleToken {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Token for a binary indicator dot (hub, sensor).
    pub fn indicator(active: bool) -> Self {
        if active {
            Self::StatusActive
        } else {
            Self::StatusEmpty
        }
    }
}
