// ── Debounced rebuild scheduling ──
//
// Per-key table of pending delayed actions. Scheduling a key that already
// has a pending action supersedes it, so a burst of rebuild requests for
// one lane collapses into the last one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug)]
struct Pending {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct Inner {
    pending: DashMap<String, Pending>,
    next_id: AtomicU64,
}

/// Cancelable, keyed, delayed actions. Cheap to clone; clones share the
/// same table. Requires a Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct RebuildScheduler {
    inner: Arc<Inner>,
}

impl RebuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once after `delay`, replacing any pending action for
    /// `key`.
    pub fn schedule<F>(&self, key: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let key = key.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let previous = self.inner.pending.insert(
            key.clone(),
            Pending {
                id,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            trace!(key = %key, "superseding pending rebuild");
            previous.cancel.cancel();
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            // Only the entry this task registered may fire.
            if inner.pending.remove_if(&key, |_, p| p.id == id).is_some() {
                action();
            }
        });
    }

    /// Cancel the pending action for `key`. Returns whether one existed.
    pub fn cancel(&self, key: &str) -> bool {
        match self.inner.pending.remove(key) {
            Some((_, pending)) => {
                pending.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending action.
    pub fn cancel_all(&self) {
        let keys: Vec<String> = self.inner.pending.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.cancel(&key);
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }
}
