//! Memoization of compiled expressions.
//!
//! Entries are keyed by the exact raw argument string, expire a fixed time
//! after they were built and are evicted least-recently-used first once the
//! cache grows past its capacity. Only successful builds are stored.
//!
//! The entry table sits behind a single mutex that is never held while an
//! expression is being parsed. Two threads missing on the same key may both
//! parse it; the second insert keeps the entry that got there first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::context::Context;
use crate::errors::Result;
use crate::expression::{parse_expression, Expression};

#[derive(Debug)]
struct CacheEntry {
    expression: Arc<Expression>,
    created_at: Instant,
    /// Logical clock value of the last hit; smallest is evicted first.
    last_used: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict(&mut self, capacity: usize, ttl: Duration, now: Instant) {
        self.entries.retain(|_, e| !e.is_expired(now, ttl));
        while self.entries.len() > capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            trace!(key = %oldest, "evicting least recently used expression");
            self.entries.remove(&oldest);
        }
    }
}

/// Thread-safe, size- and time-bounded `raw string -> Expression` map.
#[derive(Debug)]
pub struct ExpressionCache {
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::from_context(&Context::default())
    }
}

impl ExpressionCache {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self::new(ctx.cache_capacity, ctx.cache_ttl())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `raw` has a live entry. Does not count as a use.
    pub fn contains(&self, raw: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .entries
            .get(raw)
            .is_some_and(|e| !e.is_expired(now, self.ttl))
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Returns the compiled form of `raw`, parsing it on a miss.
    /// Parse failures are returned as-is and never stored.
    pub fn get_or_build(&self, raw: &str) -> Result<Arc<Expression>> {
        self.get_or_build_with(raw, parse_expression)
    }

    /// Like [`Self::get_or_build`] with a caller-supplied loader.
    pub fn get_or_build_with<F>(&self, raw: &str, build: F) -> Result<Arc<Expression>>
    where
        F: FnOnce(&str) -> Result<Expression>,
    {
        self.get_or_build_at(raw, Instant::now(), build)
    }

    pub(crate) fn get_or_build_at<F>(&self, raw: &str, now: Instant, build: F) -> Result<Arc<Expression>>
    where
        F: FnOnce(&str) -> Result<Expression>,
    {
        if let Some(hit) = self.lookup(raw, now) {
            trace!(raw, "expression cache hit");
            return Ok(hit);
        }
        trace!(raw, "expression cache miss");
        let built = Arc::new(build(raw)?);
        Ok(self.insert(raw, built, now))
    }

    fn lookup(&self, raw: &str, now: Instant) -> Option<Arc<Expression>> {
        let mut state = self.lock();
        let tick = state.next_tick();
        match state.entries.get_mut(raw) {
            None => return None,
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                entry.last_used = tick;
                return Some(Arc::clone(&entry.expression));
            }
            Some(_) => {}
        }
        trace!(raw, "expression cache entry expired");
        state.entries.remove(raw);
        None
    }

    fn insert(&self, raw: &str, expression: Arc<Expression>, now: Instant) -> Arc<Expression> {
        let mut state = self.lock();
        let tick = state.next_tick();
        if let Some(existing) = state.entries.get_mut(raw) {
            if !existing.is_expired(now, self.ttl) {
                existing.last_used = tick;
                return Arc::clone(&existing.expression);
            }
        }
        state.entries.insert(
            raw.to_string(),
            CacheEntry {
                expression: Arc::clone(&expression),
                created_at: now,
                last_used: tick,
            },
        );
        state.evict(self.capacity, self.ttl, now);
        expression
    }

    // The state is consistent after every statement, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RuleError;
    use pretty_assertions::assert_eq;

    #[test]
    fn hit_returns_same_allocation() {
        let cache = ExpressionCache::default();
        let a = cache.get_or_build("Distance > 10").unwrap();
        let b = cache.get_or_build("Distance > 10").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_whitespace_sensitive() {
        let cache = ExpressionCache::default();
        let a = cache.get_or_build("a=1").unwrap();
        let b = cache.get_or_build(" a=1").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ExpressionCache::default();
        let reject = |raw: &str| -> Result<Expression> { Err(RuleError::malformed(raw, "rejected")) };
        for _ in 0..2 {
            let err = cache.get_or_build_with("a=1", reject).unwrap_err();
            assert!(matches!(err, RuleError::MalformedExpression { ref raw, .. } if raw == "a=1"));
        }
        assert!(cache.is_empty());

        // the next successful build for the same key is stored
        cache.get_or_build("a=1").unwrap();
        assert!(cache.contains("a=1"));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ExpressionCache::new(2, Duration::from_secs(60));
        cache.get_or_build("a=1").unwrap();
        cache.get_or_build("b=1").unwrap();
        // touch `a` so `b` becomes the oldest
        cache.get_or_build("a=1").unwrap();
        cache.get_or_build("c=1").unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a=1"));
        assert!(!cache.contains("b=1"));
        assert!(cache.contains("c=1"));

        // evicted keys are rebuilt, not reported as errors
        let rebuilt = cache.get_or_build("b=1").unwrap();
        assert_eq!(rebuilt.literal(), Some("1"));
        assert!(cache.contains("b=1"));
    }

    #[test]
    fn expired_entries_are_rebuilt() {
        let cache = ExpressionCache::new(10, Duration::from_secs(60));
        let start = Instant::now();
        let first = cache.get_or_build_at("a=1", start, parse_expression).unwrap();
        let warm = cache
            .get_or_build_at("a=1", start + Duration::from_secs(30), parse_expression)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &warm));

        let later = cache
            .get_or_build_at("a=1", start + Duration::from_secs(61), parse_expression)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &later));
        assert_eq!(*first, *later);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = ExpressionCache::new(0, Duration::from_secs(1));
        assert_eq!(cache.capacity(), 1);
        cache.get_or_build("a").unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_builds_agree() {
        let cache = ExpressionCache::default();
        let shared = &cache;
        let results: Vec<Arc<Expression>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || shared.get_or_build("User Type = User").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
    }
}
