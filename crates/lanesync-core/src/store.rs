// ── Published model snapshots ──
//
// The reconciler owns the mutable model; after every pass the result is
// published here as an immutable `Arc` so readers never block it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::AfcModel;

pub struct ModelStore {
    model: watch::Sender<Arc<AfcModel>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        let (model, _) = watch::channel(Arc::new(AfcModel::default()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            model,
            last_refresh,
        }
    }

    /// Publish a new model and stamp the refresh time.
    pub(crate) fn publish(&self, model: AfcModel) {
        self.model.send_replace(Arc::new(model));
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    pub fn snapshot(&self) -> Arc<AfcModel> {
        Arc::clone(&self.model.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AfcModel>> {
        self.model.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// Time since the last successful refresh.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_updates_subscribers_and_timestamp() {
        let store = ModelStore::new();
        let mut rx = store.subscribe();
        assert!(store.last_refresh().is_none());

        let mut model = AfcModel::default();
        model.system.current_load = Some("lane1".into());
        store.publish(model);

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(
            rx.borrow_and_update().system.current_load.as_deref(),
            Some("lane1")
        );
        assert!(store.last_refresh().is_some());
        assert!(store.data_age().is_some());
    }
}
