//! Per-IP inbound rate limiting
//!
//! Fixed-window counting per client IP, kept in process memory. The first
//! request from an IP opens a window; requests beyond the limit inside the
//! window are refused until the window rolls over. Expired entries are swept
//! at most once per window length to keep the map bounded.
//!
//! State is per process. Replicas each enforce their own limit.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::RateLimitConfig;

/// Outcome of a rate limit check, with the data the response headers need
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted
    Allowed {
        /// Window limit
        limit: u32,
        /// Requests left in the current window
        remaining: u32,
        /// Seconds until the current window resets
        reset_secs: u64,
    },
    /// Request refused
    Limited {
        /// Window limit
        limit: u32,
        /// Seconds the caller should wait before retrying
        retry_after_secs: u64,
        /// Seconds until the current window resets
        reset_secs: u64,
    },
}

/// Per-IP counter for the current window
#[derive(Debug, Clone, Copy)]
struct Entry {
    window_start: Instant,
    count: u32,
}

#[derive(Debug)]
struct Inner {
    entries: HashMap<IpAddr, Entry>,
    last_sweep: Instant,
}

/// In-memory fixed-window rate limiter keyed by client IP
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    inner: RwLock<Inner>,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` requests per `window` per IP
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Create a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Window limit
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Check and count a request from the given IP
    pub fn check(&self, addr: IpAddr) -> Decision {
        self.check_at(addr, Instant::now())
    }

    /// Check and count a request at an explicit instant
    pub fn check_at(&self, addr: IpAddr, now: Instant) -> Decision {
        let mut inner = match self.inner.write() {
            Ok(guard) => guard,
            // A poisoned lock only means another check panicked; the map
            // itself is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };

        self.sweep_expired(&mut inner, now);

        let entry = inner.entries.entry(addr).or_insert(Entry {
            window_start: now,
            count: 0,
        });

        // Roll the window over once it has fully elapsed
        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        let elapsed = now.duration_since(entry.window_start);
        let reset_secs = self.window.saturating_sub(elapsed).as_secs();

        if entry.count >= self.limit {
            let retry_after_secs = reset_secs.max(1);
            warn!(
                client_ip = %addr,
                limit = self.limit,
                retry_after_secs = retry_after_secs,
                "Rate limit exceeded"
            );
            return Decision::Limited {
                limit: self.limit,
                retry_after_secs,
                reset_secs,
            };
        }

        entry.count += 1;
        Decision::Allowed {
            limit: self.limit,
            remaining: self.limit - entry.count,
            reset_secs,
        }
    }

    /// Drop entries whose window has fully elapsed, at most once per window
    fn sweep_expired(&self, inner: &mut Inner, now: Instant) {
        if now.duration_since(inner.last_sweep) < self.window {
            return;
        }

        let window = self.window;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.window_start) <= window);
        inner.last_sweep = now;

        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed = removed, "Swept expired rate limit entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    // Test 1: Requests up to the limit are admitted with decreasing remaining
    #[test]
    fn test_admits_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            match limiter.check_at(ip(1), now) {
                Decision::Allowed { remaining, limit, .. } => {
                    assert_eq!(limit, 3);
                    assert_eq!(remaining, expected_remaining);
                }
                other => panic!("Expected Allowed, got {:?}", other),
            }
        }
    }

    // Test 2: The request past the limit is refused with a positive wait
    #[test]
    fn test_refuses_past_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));

        match limiter.check_at(ip(1), now) {
            Decision::Limited {
                limit,
                retry_after_secs,
                reset_secs,
            } => {
                assert_eq!(limit, 2);
                assert!(retry_after_secs >= 1);
                assert!(retry_after_secs <= 60);
                assert!(reset_secs <= 60);
            }
            other => panic!("Expected Limited, got {:?}", other),
        }
    }

    // Test 3: Counters are independent per IP
    #[test]
    fn test_per_ip_isolation() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), now), Decision::Limited { .. }));
        // A different IP still has its full budget
        assert!(matches!(limiter.check_at(ip(2), now), Decision::Allowed { .. }));
    }

    // Test 4: The window rolls over and the counter resets
    #[test]
    fn test_window_rollover() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(matches!(limiter.check_at(ip(1), start), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at(ip(1), start), Decision::Limited { .. }));

        let later = start + Duration::from_secs(61);
        match limiter.check_at(ip(1), later) {
            Decision::Allowed { remaining, .. } => assert_eq!(remaining, 0),
            other => panic!("Expected Allowed after rollover, got {:?}", other),
        }
    }

    // Test 5: Mid-window requests see a shrinking reset horizon
    #[test]
    fn test_reset_horizon_shrinks() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        let first = limiter.check_at(ip(1), start);
        let later = limiter.check_at(ip(1), start + Duration::from_secs(20));

        let (Decision::Allowed { reset_secs: r1, .. }, Decision::Allowed { reset_secs: r2, .. }) =
            (first, later)
        else {
            panic!("Expected both requests admitted");
        };
        assert_eq!(r1, 60);
        assert_eq!(r2, 40);
    }

    // Test 6: Expired entries are swept after a full window
    #[test]
    fn test_sweep_drops_expired_entries() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at(ip(1), start);
        limiter.check_at(ip(2), start);
        assert_eq!(limiter.inner.read().unwrap().entries.len(), 2);

        // Two windows later only the fresh caller remains
        limiter.check_at(ip(3), start + Duration::from_secs(121));
        let inner = limiter.inner.read().unwrap();
        assert_eq!(inner.entries.len(), 1);
        assert!(inner.entries.contains_key(&ip(3)));
    }

    // Test 7: Parallel bursts from one address never admit more than the limit
    #[test]
    fn test_no_lost_updates_under_parallel_checks() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(60)));
        let admitted = Arc::new(AtomicU32::new(0));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        if matches!(limiter.check_at(ip(1), now), Decision::Allowed { .. }) {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 160 attempts against a budget of 50
        assert_eq!(admitted.load(Ordering::SeqCst), 50);
    }

    // Test 8: Retry-After is clamped to at least one second
    #[test]
    fn test_retry_after_minimum() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at(ip(1), start);
        // Refused at the very end of the window
        match limiter.check_at(ip(1), start + Duration::from_millis(59_900)) {
            Decision::Limited { retry_after_secs, .. } => assert_eq!(retry_after_secs, 1),
            other => panic!("Expected Limited, got {:?}", other),
        }
    }
}
