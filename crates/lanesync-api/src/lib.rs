//! Async client for the printer's request/response API.
//!
//! Only the endpoints the filament-lane synchronization needs are covered:
//! the filament-changer status snapshot, the object directory, per-object
//! queries, and directive submission.

pub mod client;
pub mod error;
mod models;
pub mod transport;

pub use client::PrinterClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
