//! `watch`: poll in the background and print each intent as it arrives.

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use lanesync_core::{Controller, Intent};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

fn format_intent(intent: &Intent, format: OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(intent, true),
        // One-item sequences concatenate into a single YAML list.
        OutputFormat::Yaml => {
            output::render_yaml(std::slice::from_ref(intent)).map(|y| y.trim_end().to_owned())
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let stamp = Local::now().format("%H:%M:%S%.3f").to_string();
            if color {
                Ok(format!("{} {intent}", stamp.dimmed()))
            } else {
                Ok(format!("{stamp} {intent}"))
            }
        }
    }
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let mut intents = controller.intents();
    controller.connect().await?;

    let color = output::should_color(global.color);
    if !global.quiet {
        let model = controller.model();
        eprintln!(
            "Watching {} lanes across {} units (Ctrl-C to stop)",
            model.lanes().count(),
            model.units.len()
        );
    }

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            received = intents.recv() => match received {
                Ok(intent) => {
                    let line = format_intent(&intent, global.output, color)?;
                    output::print_output(&line, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "intent stream lagged");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    controller.disconnect().await;
    result
}
