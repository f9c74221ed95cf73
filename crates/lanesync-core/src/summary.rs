// ── "Currently loaded" summary ──

use serde::Serialize;

use crate::model::Lane;

/// What the system summary display shows for the active lane.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSummary {
    /// Lane in the toolhead, if any.
    pub lane: Option<String>,
    pub extruder: Option<String>,
    pub map: Option<String>,
    /// Live auxiliary reading for the lane, when resolvable.
    pub aux_value: Option<f64>,
    pub sensor_label: String,
}

impl SystemSummary {
    pub fn new(lane: Option<&Lane>, aux_value: Option<f64>) -> Self {
        Self {
            lane: lane.map(|l| l.name.clone()),
            extruder: lane.and_then(|l| l.extruder.clone()),
            map: lane.and_then(|l| l.map.clone()),
            aux_value,
            sensor_label: sensor_label(lane, aux_value),
        }
    }
}

/// Feed-pressure reading if known, else the lane's buffer state.
pub fn sensor_label(lane: Option<&Lane>, aux_value: Option<f64>) -> String {
    if let Some(value) = aux_value {
        return format!("FPS: {value:.2}");
    }
    match lane.and_then(|l| l.buffer.as_deref().zip(l.buffer_status.as_deref())) {
        Some((buffer, status)) => format!("Buffer: {buffer} - {status}"),
        None => "Buffer: N/A".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_aux_value() {
        let mut lane = Lane::new("lane1", "AMS_1");
        lane.buffer = Some("TN".into());
        lane.buffer_status = Some("Advancing".into());

        assert_eq!(sensor_label(Some(&lane), Some(0.4567)), "FPS: 0.46");
        assert_eq!(sensor_label(Some(&lane), None), "Buffer: TN - Advancing");

        lane.buffer_status = None;
        assert_eq!(sensor_label(Some(&lane), None), "Buffer: N/A");
        assert_eq!(sensor_label(None, None), "Buffer: N/A");
    }

    #[test]
    fn summary_for_no_lane() {
        let summary = SystemSummary::new(None, None);
        assert!(summary.lane.is_none());
        assert_eq!(summary.sensor_label, "Buffer: N/A");
    }
}
