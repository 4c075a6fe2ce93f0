//! Token price cache with an explicit, clock-injected staleness check

use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A cached value together with the moment it was fetched
#[derive(Debug, Clone, Copy)]
pub struct Cached<T> {
    pub value: T,
    pub fetched_at: Instant,
}

impl<T> Cached<T> {
    pub fn new(value: T, fetched_at: Instant) -> Self {
        Self { value, fetched_at }
    }

    /// Pure staleness predicate; the caller supplies the clock
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.fetched_at) > ttl
    }
}

/// Thread-safe single-slot cache for the settlement token price
pub struct PriceCache {
    slot: RwLock<Option<Cached<f64>>>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Get the cached price if it is still fresh at `now`
    pub fn get_fresh(&self, now: Instant) -> Option<f64> {
        let slot = self.slot.read().ok()?;
        let cached = slot.as_ref()?;

        if cached.is_stale(now, self.ttl) {
            None
        } else {
            Some(cached.value)
        }
    }

    /// Store a freshly fetched price
    pub fn store(&self, value: f64, now: Instant) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(Cached::new(value, now));
        }
    }

    /// Drop the cached value
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        // Token price moves slowly enough for a 60 second TTL
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness_is_pure_in_the_clock() {
        let t0 = Instant::now();
        let cached = Cached::new(42.0, t0);
        let ttl = Duration::from_secs(60);

        assert!(!cached.is_stale(t0, ttl));
        assert!(!cached.is_stale(t0 + Duration::from_secs(60), ttl));
        assert!(cached.is_stale(t0 + Duration::from_secs(61), ttl));
    }

    #[test]
    fn test_get_fresh_honors_ttl() {
        let cache = PriceCache::new(Duration::from_secs(30));
        let t0 = Instant::now();

        assert_eq!(cache.get_fresh(t0), None);

        cache.store(1.25, t0);
        assert_eq!(cache.get_fresh(t0 + Duration::from_secs(29)), Some(1.25));
        assert_eq!(cache.get_fresh(t0 + Duration::from_secs(31)), None);
    }

    #[test]
    fn test_invalidate_clears_slot() {
        let cache = PriceCache::new(Duration::from_secs(30));
        let t0 = Instant::now();

        cache.store(2.5, t0);
        cache.invalidate();
        assert_eq!(cache.get_fresh(t0), None);
    }
}
