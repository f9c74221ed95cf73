//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod lane;
pub mod lanes;
pub mod system;
pub mod watch;

use lanesync_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a printer-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Lanes => lanes::handle(controller, global),
        Command::Lane(args) => lane::handle(controller, args, global).await,
        Command::Summary => system::summary(controller, global).await,
        Command::Led { state } => system::led(controller, state, global).await,
        Command::Bypass { state } => system::bypass(controller, state, global).await,
        Command::Calibrate => system::calibrate(controller, global).await,
        Command::Config(_) | Command::Completions(_) | Command::Watch(_) => Err(
            CliError::Internal("command is handled before dispatch".into()),
        ),
    }
}
