// ── Runtime connection configuration ──
//
// These types describe *how* to talk to a printer and how often to poll.
// They carry credential data and timing, but never touch disk. The CLI
// constructs a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default; most printer hosts speak plain HTTP.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for synchronizing with a single printer.
///
/// Built by the CLI, passed to `Controller`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// API root (e.g., `http://printer.local:7125`).
    pub url: Url,
    /// Optional API key, sent as `X-Api-Key`.
    pub api_key: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Primary snapshot poll cadence. Zero disables the background task.
    pub refresh_interval: Duration,
    /// Lightweight filament-sensor poll cadence. Zero disables it.
    pub sensor_poll_interval: Duration,
    /// Time-to-live of cached auxiliary object statuses.
    pub aux_cache_ttl: Duration,
    /// Delay applied to coalesced lane view rebuilds.
    pub rebuild_debounce: Duration,
}

impl ControllerConfig {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_SENSOR_POLL_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_AUX_CACHE_TTL: Duration = Duration::from_millis(500);
    pub const DEFAULT_REBUILD_DEBOUNCE: Duration = Duration::from_millis(50);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Config for `url` with every other knob at its default.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            sensor_poll_interval: Self::DEFAULT_SENSOR_POLL_INTERVAL,
            aux_cache_ttl: Self::DEFAULT_AUX_CACHE_TTL,
            rebuild_debounce: Self::DEFAULT_REBUILD_DEBOUNCE,
        }
    }
}
