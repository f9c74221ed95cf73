//! Single-lane inspection and commands.

use lanesync_core::{Command as CoreCommand, Controller};

use crate::cli::{GlobalOpts, LaneArgs, LaneCommand};
use crate::error::CliError;
use crate::output;

use super::lanes;

/// Translate a lane subcommand into its directive. `Show` has none.
fn to_core(command: LaneCommand) -> Option<(CoreCommand, &'static str)> {
    let mapped = match command {
        LaneCommand::Show { .. } => return None,
        LaneCommand::Load { lane } => (CoreCommand::ChangeTool { lane }, "Tool change started"),
        LaneCommand::Unload => (CoreCommand::UnloadTool, "Tool unload started"),
        LaneCommand::Eject { lane } => (CoreCommand::EjectLane { lane }, "Lane eject started"),
        LaneCommand::SetLoaded { lane } => {
            (CoreCommand::SetLaneLoaded { lane }, "Lane marked as loaded")
        }
        LaneCommand::UnsetLoaded => (CoreCommand::UnsetLaneLoaded, "Loaded lane cleared"),
        LaneCommand::SetMap { lane, map } => (CoreCommand::SetMap { lane, map }, "Map updated"),
        LaneCommand::SetRunout { lane, runout } => {
            (CoreCommand::SetRunout { lane, runout }, "Runout lane updated")
        }
        LaneCommand::SetMaterial { lane, material } => {
            (CoreCommand::SetMaterial { lane, material }, "Material updated")
        }
        LaneCommand::SetColor { lane, color } => {
            (CoreCommand::SetColor { lane, color }, "Color updated")
        }
        LaneCommand::SetWeight { lane, weight } => {
            (CoreCommand::SetWeight { lane, weight }, "Weight updated")
        }
        LaneCommand::SetSpool { lane, spool_id } => {
            (CoreCommand::SetSpoolId { lane, spool_id }, "Spool updated")
        }
        LaneCommand::Move { lane, distance } => {
            (CoreCommand::MoveLane { lane, distance }, "Move sent")
        }
        LaneCommand::Test { lane } => (CoreCommand::TestLane { lane }, "Lane test started"),
    };
    Some(mapped)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: LaneArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let LaneCommand::Show { ref lane } = args.command {
        let model = controller.model();
        let found = model
            .lane(lane)
            .ok_or_else(|| CliError::lane_not_found(lane.as_str()))?;
        let out = output::render_single(global.output, found, lanes::detail, |l| {
            l.status().to_string()
        })?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let Some((command, done)) = to_core(args.command) else {
        return Ok(());
    };
    controller.execute(command).await?;
    if !global.quiet {
        eprintln!("{done}");
    }
    Ok(())
}
