//! Status-sync core between `lanesync-api` and its consumers (CLI).
//!
//! This crate owns the filament changer's domain model and keeps it in
//! step with the printer host:
//!
//! - **[`Controller`]**: lifecycle facade. [`connect()`](Controller::connect)
//!   fetches the initial snapshot and spawns the refresh and sensor polls;
//!   [`Controller::oneshot()`](Controller::oneshot) runs a single CLI
//!   invocation without background tasks.
//!
//! - **[`Reconciler`]**: diffs every fresh snapshot against the in-memory
//!   [`AfcModel`] and emits ordered [`Intent`]s for the presentation layer.
//!   Lane rebuilds are debounced per lane by [`RebuildScheduler`].
//!
//! - **[`LaneStatus`]**: one status per lane derived from its sensor flags,
//!   with category and style-token mappings.
//!
//! - **[`auxiliary`]**: name resolution and TTL caching for feed-pressure
//!   readings published by an external aggregator.
//!
//! - **[`Command`]**: validated outbound directives.

pub mod auxiliary;
pub mod command;
pub mod config;
pub mod controller;
mod convert;
pub mod debounce;
pub mod error;
pub mod intent;
pub mod model;
pub mod poll;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod summary;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auxiliary::{AuxResolver, ObjectRegistry, ObjectSource, StatusCache};
pub use command::Command;
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use convert::round_weight;
pub use debounce::RebuildScheduler;
pub use error::CoreError;
pub use intent::{Intent, LaneField};
pub use model::{AfcModel, AfcSystem, BuiltModel, Buffer, Extruder, Hub, Lane, Unit};
pub use reconcile::{Reconciler, Reconciliation};
pub use status::{LaneStatus, StatusCategory, StyleToken, derive_status};
pub use store::ModelStore;
pub use summary::SystemSummary;
