mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lanesync_core::Controller;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a printer connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "lanesync", &mut std::io::stdout());
            Ok(())
        }

        Command::Watch(args) => {
            let mut config = config::build_controller_config(&cli.global)?;
            if let Some(ms) = args.interval_ms {
                config.refresh_interval = Duration::from_millis(ms);
            }
            if let Some(secs) = args.sensor_interval {
                config.sensor_poll_interval = Duration::from_secs(secs);
            }
            let controller = Controller::new(config);
            commands::watch::handle(&controller, &cli.global).await
        }

        // Everything else is a single round trip without background polls
        cmd => {
            let mut config = config::build_controller_config(&cli.global)?;
            config.refresh_interval = Duration::ZERO;
            config.sensor_poll_interval = Duration::ZERO;

            let controller = Controller::new(config);
            controller.connect().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.disconnect().await;
            result
        }
    }
}
