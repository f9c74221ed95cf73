//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use lanesync_config::ConfigError;
use lanesync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the printer at {url}: {reason}")]
    #[diagnostic(
        code(lanesync::connection_failed),
        help(
            "Check that the printer host is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Not connected to the printer")]
    #[diagnostic(code(lanesync::disconnected))]
    Disconnected,

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(lanesync::timeout),
        help("Increase timeout with --timeout or check printer responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lanesync::not_found),
        help("Run: lanesync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Printer rejected the request: {message}")]
    #[diagnostic(code(lanesync::api_error))]
    ApiError { message: String },

    #[error("Unexpected printer data in {section}: {reason}")]
    #[diagnostic(
        code(lanesync::malformed),
        help("The filament changer status did not have the expected layout.")
    )]
    Malformed { section: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lanesync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No printer configured")]
    #[diagnostic(
        code(lanesync::no_config),
        help(
            "Create a profile with: lanesync config init\n\
             Or pass --printer http://<host>:7125\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lanesync::config))]
    Config(#[from] ConfigError),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(lanesync::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(lanesync::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn lane_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "lane".into(),
            identifier: name.into(),
            list_command: "lanes".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::ControllerDisconnected => Self::Disconnected,
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::LaneNotFound { name } => Self::lane_not_found(name),
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::MalformedSnapshot { section, reason } => Self::Malformed { section, reason },
            CoreError::Api { message, code } => Self::ApiError {
                message: match code {
                    Some(code) => format!("{message} (code {code})"),
                    None => message,
                },
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}
