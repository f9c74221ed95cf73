//! Lane listing and detail views.

use tabled::Tabled;

use lanesync_core::{Controller, Lane};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LaneRow {
    #[tabled(rename = "Lane")]
    name: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Map")]
    map: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Color")]
    color: String,
}

impl LaneRow {
    fn new(lane: &Lane, color: bool) -> Self {
        Self {
            name: lane.name.clone(),
            unit: lane.unit.clone(),
            status: output::paint_status(lane.status(), color),
            map: lane.map.clone().unwrap_or_default(),
            material: lane.material.clone().unwrap_or_default(),
            weight: format!("{} g", lane.weight),
            color: lane.display_color().unwrap_or_default(),
        }
    }
}

pub(crate) fn detail(lane: &Lane) -> String {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    let mut lines = vec![
        format!("Lane:      {}", lane.name),
        format!("Unit:      {}", lane.unit),
        format!(
            "Status:    {} ({})",
            lane.status(),
            lane.status().category()
        ),
        format!("Map:       {}", or_dash(lane.map.as_deref())),
        format!("Material:  {}", or_dash(lane.material.as_deref())),
        format!("Weight:    {} g", lane.weight),
        format!("Color:     {}", lane.display_color().unwrap_or_else(|| "-".into())),
        format!("Hub:       {}", or_dash(lane.hub.as_deref())),
        format!("Extruder:  {}", or_dash(lane.extruder.as_deref())),
        format!("Runout:    {}", or_dash(lane.runout_lane.as_deref())),
        format!(
            "Sensors:   prep={} load={} tool={}",
            lane.prep, lane.load, lane.tool_loaded
        ),
    ];
    if lane.spool_id > 0 {
        lines.push(format!("Spool:     #{}", lane.spool_id));
    }
    if let (Some(buffer), Some(status)) = (&lane.buffer, &lane.buffer_status) {
        lines.push(format!("Buffer:    {buffer} - {status}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let model = controller.model();
    let lanes: Vec<Lane> = model.lanes().cloned().collect();
    let color = output::should_color(global.color);

    let out = output::render_list(
        global.output,
        &lanes,
        |l| LaneRow::new(l, color),
        |l| l.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
