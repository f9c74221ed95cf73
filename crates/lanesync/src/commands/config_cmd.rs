//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out, "\n[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "refresh_ms = {}", d.refresh_ms);
    let _ = writeln!(out, "sensor_poll = {}", d.sensor_poll);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out, "\n[profiles.{name}]");
        let _ = writeln!(out, "printer = \"{}\"", p.printer);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(refresh) = p.refresh_ms {
            let _ = writeln!(out, "refresh_ms = {refresh}");
        }
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Store the key in the keyring, or hand it back for the config file.
fn store_api_key(profile_name: &str, key: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    if selection != 0 {
        return Ok(Some(key));
    }

    let entry = keyring::Entry::new(
        lanesync_config::KEYRING_SERVICE,
        &format!("{profile_name}/api-key"),
    )
    .and_then(|entry| entry.set_password(&key).map(|()| entry));
    match entry {
        Ok(_) => {
            eprintln!("   API key stored in system keyring");
            Ok(None)
        }
        Err(e) => Err(CliError::Validation {
            field: "keyring".into(),
            reason: format!("failed to store API key: {e}"),
        }),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(global.output, &cfg, format_config_redacted, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => {
            let mut cfg = config::load_config_or_default();
            eprintln!("lanesync configuration");
            eprintln!("   Config path: {}\n", config::config_path().display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(config::active_profile_name(global, &cfg))
                .interact_text()
                .map_err(prompt_err)?;

            let printer: String = Input::new()
                .with_prompt("Printer API URL")
                .default(
                    global
                        .printer
                        .clone()
                        .unwrap_or_else(|| "http://localhost:7125".into()),
                )
                .validate_with(|input: &String| {
                    lanesync_config::parse_printer_url(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let key = Password::new()
                .with_prompt("API key (leave empty if none)")
                .allow_empty_password(true)
                .interact()
                .map_err(prompt_err)?;
            let mut profile = cfg.profiles.remove(&profile_name).unwrap_or_default();
            profile.printer = printer;
            if !key.is_empty() {
                profile.api_key = store_api_key(&profile_name, key)?;
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            let path = config::save_config(&cfg)?;
            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: lanesync lanes");
            Ok(())
        }
    }
}
