// ── Time-bounded status cache ──
//
// Two tiers: one slot for the aggregator manager, one per resolved
// object. Failed fetches are stored as `None` so a failing object is not
// re-queried until its slot expires.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

pub type Status = Map<String, Value>;

#[derive(Debug, Clone)]
struct Slot {
    fetched_at: Instant,
    value: Option<Status>,
}

impl Slot {
    fn fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug)]
pub struct StatusCache {
    ttl: Duration,
    manager: Option<Slot>,
    objects: HashMap<String, Slot>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            manager: None,
            objects: HashMap::new(),
        }
    }

    /// Manager status, fetched through `fetch` unless a fresh slot exists.
    pub async fn manager<F, Fut>(&mut self, fetch: F) -> Option<Status>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Status>>,
    {
        let now = Instant::now();
        if let Some(slot) = self.manager.as_ref().filter(|s| s.fresh(self.ttl, now)) {
            return slot.value.clone();
        }
        let value = fetch().await;
        self.manager = Some(Slot {
            fetched_at: Instant::now(),
            value: value.clone(),
        });
        value
    }

    /// Status of one resolved object, read through like [`Self::manager`].
    pub async fn object<F, Fut>(&mut self, name: &str, fetch: F) -> Option<Status>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Status>>,
    {
        let now = Instant::now();
        if let Some(slot) = self.objects.get(name).filter(|s| s.fresh(self.ttl, now)) {
            return slot.value.clone();
        }
        let value = fetch().await;
        self.objects.insert(
            name.to_owned(),
            Slot {
                fetched_at: Instant::now(),
                value: value.clone(),
            },
        );
        value
    }

    /// Drop both tiers regardless of age.
    pub fn invalidate(&mut self) {
        self.manager = None;
        self.objects.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    const TTL: Duration = Duration::from_millis(500);

    fn status(v: f64) -> Status {
        let mut map = Map::new();
        map.insert("fps_value".into(), json!(v));
        map
    }

    #[tokio::test(start_paused = true)]
    async fn reads_within_ttl_hit_the_cache() {
        let mut cache = StatusCache::new(TTL);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            async { Some(status(1.0)) }
        };

        assert_eq!(cache.object("oams a", fetch).await, Some(status(1.0)));
        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.object("oams a", fetch).await, Some(status(1.0)));
        assert_eq!(calls.get(), 1);

        tokio::time::advance(Duration::from_millis(2)).await;
        cache.object("oams a", fetch).await;
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_cached_too() {
        let mut cache = StatusCache::new(TTL);
        let calls = Cell::new(0);
        let failing = || {
            calls.set(calls.get() + 1);
            async { None }
        };

        assert!(cache.manager(failing).await.is_none());
        assert!(cache.manager(failing).await.is_none());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_a_fetch() {
        let mut cache = StatusCache::new(TTL);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            async { Some(status(2.0)) }
        };

        cache.manager(fetch).await;
        cache.object("oams b", fetch).await;
        cache.invalidate();
        cache.manager(fetch).await;
        cache.object("oams b", fetch).await;
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn objects_expire_independently() {
        let mut cache = StatusCache::new(TTL);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            async { Some(status(3.0)) }
        };

        cache.object("oams a", fetch).await;
        tokio::time::advance(Duration::from_millis(300)).await;
        cache.object("oams b", fetch).await;
        tokio::time::advance(Duration::from_millis(300)).await;
        cache.object("oams a", fetch).await;
        cache.object("oams b", fetch).await;
        assert_eq!(calls.get(), 3);
    }
}
