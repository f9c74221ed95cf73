//! System-wide commands: summary, LEDs, bypass, calibration.

use lanesync_core::{Command as CoreCommand, Controller, SystemSummary};

use crate::cli::{GlobalOpts, Toggle};
use crate::error::CliError;
use crate::output;

fn summary_detail(s: &SystemSummary) -> String {
    match s.lane {
        Some(ref lane) => [
            format!("Loaded:   {lane}"),
            format!("Extruder: {}", s.extruder.as_deref().unwrap_or("-")),
            format!("Map:      {}", s.map.as_deref().unwrap_or("-")),
            s.sensor_label.clone(),
        ]
        .join("\n"),
        None => "No lane loaded".into(),
    }
}

pub async fn summary(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let summary = controller.system_summary().await;
    let out = output::render_single(global.output, &summary, summary_detail, |s| {
        s.lane.clone().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn led(controller: &Controller, state: Toggle, global: &GlobalOpts) -> Result<(), CliError> {
    controller
        .execute(CoreCommand::SetLed { on: state.is_on() })
        .await?;
    if !global.quiet {
        eprintln!("LEDs {}", if state.is_on() { "on" } else { "off" });
    }
    Ok(())
}

pub async fn bypass(
    controller: &Controller,
    state: Toggle,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller
        .execute(CoreCommand::SetVirtualBypass {
            enabled: state.is_on(),
        })
        .await?;
    if !global.quiet {
        let word = if state.is_on() { "enabled" } else { "disabled" };
        eprintln!("Virtual bypass {word}");
    }
    Ok(())
}

pub async fn calibrate(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.execute(CoreCommand::Calibrate).await?;
    if !global.quiet {
        eprintln!("Calibration started");
    }
    Ok(())
}
