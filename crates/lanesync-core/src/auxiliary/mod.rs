// ── Auxiliary aggregator objects ──
//
// Some feeder units report live readings (feed-pressure sensor values)
// through an external aggregator that publishes one object per unit under
// loosely spelled names. This module resolves those names and caches the
// fetched statuses for a short TTL.

mod cache;
mod registry;
mod variants;

pub use cache::{Status, StatusCache};
pub use registry::{MANAGER_OBJECT, ObjectRegistry};
pub use variants::{OBJECT_KEYWORD, collect_variants};

use std::future::Future;
use std::time::Duration;

use lanesync_api::PrinterClient;
use serde_json::Value;
use tracing::debug;

use crate::convert::opt_f64;
use crate::error::CoreError;
use crate::model::{Lane, Unit};

/// Field of a unit object carrying the feed-pressure reading.
pub const FPS_FIELD: &str = "fps_value";

/// Anything that can fetch one printer object's status.
pub trait ObjectSource: Sync {
    fn fetch_object(
        &self,
        name: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<Option<Status>, CoreError>> + Send;
}

impl ObjectSource for PrinterClient {
    fn fetch_object(
        &self,
        name: &str,
        fields: &[&str],
    ) -> impl Future<Output = Result<Option<Status>, CoreError>> + Send {
        async move { Ok(self.query_object(name, fields).await?) }
    }
}

/// Registry plus cache: turns a lane into its live auxiliary reading.
#[derive(Debug)]
pub struct AuxResolver {
    registry: ObjectRegistry,
    cache: StatusCache,
}

impl AuxResolver {
    pub fn new(ttl: Duration) -> Self {
        Self {
            registry: ObjectRegistry::default(),
            cache: StatusCache::new(ttl),
        }
    }

    pub fn register_objects<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.register_objects(names);
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Live feed-pressure value for `lane`, if every link resolves.
    ///
    /// Walks: aggregator unit, lane map, manager status, matching group
    /// entry, its referenced unit object, and finally [`FPS_FIELD`]. Any
    /// missing link yields `None`.
    pub async fn lane_value<S: ObjectSource>(
        &mut self,
        source: &S,
        unit: &Unit,
        lane: &Lane,
    ) -> Option<f64> {
        if !unit.uses_aggregator() {
            return None;
        }
        let group = normalize_group(lane.map.as_deref()?)?;
        if !self.registry.manager_available() {
            return None;
        }

        let manager = self
            .cache
            .manager(|| fetch_logged(source, MANAGER_OBJECT, &[]))
            .await?;
        let object_ref = group_object(&manager, &group)?;
        let object = self.registry.resolve(&object_ref)?.to_owned();

        let status = self
            .cache
            .object(&object, || fetch_logged(source, &object, &[FPS_FIELD]))
            .await?;
        status
            .get(FPS_FIELD)
            .and_then(opt_f64)
            .filter(|v| v.is_finite())
    }
}

async fn fetch_logged<S: ObjectSource>(source: &S, name: &str, fields: &[&str]) -> Option<Status> {
    match source.fetch_object(name, fields).await {
        Ok(status) => status,
        Err(e) => {
            debug!(object = name, error = %e, "auxiliary fetch failed");
            None
        }
    }
}

fn normalize_group(raw: &str) -> Option<String> {
    let group = raw.trim().to_uppercase();
    (!group.is_empty()).then_some(group)
}

/// Object referenced by the manager entry serving `group`.
///
/// An entry whose `current_group` equals `group` wins; otherwise the first
/// entry whose key ends in `group` is used.
fn group_object(manager: &Status, group: &str) -> Option<String> {
    let mut fallback = None;
    for (key, value) in manager {
        if key.eq_ignore_ascii_case(OBJECT_KEYWORD) {
            continue;
        }
        let Some(entry) = value.as_object() else {
            continue;
        };
        let current = entry
            .get("current_group")
            .and_then(Value::as_str)
            .and_then(normalize_group);
        if current.as_deref() == Some(group) {
            fallback = Some(entry);
            break;
        }
        if fallback.is_none()
            && key
                .split_whitespace()
                .last()
                .and_then(normalize_group)
                .as_deref()
                == Some(group)
        {
            fallback = Some(entry);
        }
    }

    match fallback?.get("current_oams")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
