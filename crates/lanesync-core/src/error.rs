// ── Core error types ──
//
// User-facing errors from lanesync-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<lanesync_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to printer at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Printer connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed snapshot ({section}): {reason}")]
    MalformedSnapshot { section: String, reason: String },

    #[error("Lane not found: {name}")]
    LaneNotFound { name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Code from the error envelope or the HTTP status (if applicable).
        code: Option<i64>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn malformed(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            section: section.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lanesync_api::Error> for CoreError {
    fn from(err: lanesync_api::Error) -> Self {
        match err {
            lanesync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: e.status().map(|s| i64::from(s.as_u16())),
                    }
                }
            }
            lanesync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lanesync_api::Error::InvalidApiKey(reason) => CoreError::Config {
                message: format!("Invalid API key: {reason}"),
            },
            lanesync_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            lanesync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            lanesync_api::Error::Rpc { code, message } => CoreError::Api {
                message,
                code: Some(code),
            },
            lanesync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            lanesync_api::Error::UnexpectedShape(reason) => CoreError::malformed("response", reason),
        }
    }
}
