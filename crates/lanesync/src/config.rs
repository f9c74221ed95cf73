//! CLI configuration: thin wrapper around `lanesync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--printer, --api-key, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use lanesync_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use lanesync_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and flags.
///
/// Flags win over profile values. Without a profile, `--printer` alone
/// is enough.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut config = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            let mut profile = profile.clone();
            if let Some(ref printer) = global.printer {
                profile.printer.clone_from(printer);
            }
            lanesync_config::profile_to_controller_config(&profile, &profile_name, &cfg.defaults)?
        }
        None => {
            if global.profile.is_some() {
                return Err(lanesync_config::ConfigError::ProfileNotFound { name: profile_name }.into());
            }
            let printer = global.printer.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let mut config = ControllerConfig::new(lanesync_config::parse_printer_url(printer)?);
            config.timeout = Duration::from_secs(cfg.defaults.timeout);
            config
        }
    };

    if let Some(ref key) = global.api_key {
        config.api_key = Some(SecretString::from(key.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
