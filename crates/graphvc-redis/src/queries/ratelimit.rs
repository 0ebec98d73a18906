//! Fixed-window daily generation limits.
//!
//! Anonymous callers are counted per client IP, signed-in callers per user id.
//! The counter for a window lives at `<prefix>:<identifier>:<window index>`
//! and expires with the window.

use redis::AsyncCommands;
use serde::Serialize;

use graphvc_core::api::UsageInfo;

use crate::client::{RedisPool, RedisResult};

pub const ANON_PREFIX: &str = "ratelimit:anon";
pub const AUTH_PREFIX: &str = "ratelimit:auth";
pub const ANONYMOUS_USER: &str = "anonymous";

pub const DAILY_LIMIT: u32 = 3;
pub const WINDOW_SECS: u64 = 86_400;

/// A fixed counting window.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for FixedWindow {
    fn default() -> Self {
        Self {
            max_requests: DAILY_LIMIT,
            window_secs: WINDOW_SECS,
        }
    }
}

impl FixedWindow {
    pub fn window_index(&self, now: u64) -> u64 {
        now / self.window_secs
    }

    /// Unix time at which the current window ends.
    pub fn reset_at(&self, now: u64) -> u64 {
        (self.window_index(now) + 1) * self.window_secs
    }

    pub fn key(&self, prefix: &str, identifier: &str, now: u64) -> String {
        format!("{}:{}:{}", prefix, identifier, self.window_index(now))
    }

    /// Outcome of the `count`-th request in the window.
    pub fn decide(&self, count: u32, now: u64) -> RateLimitDecision {
        let reset = self.reset_at(now);
        RateLimitDecision {
            allowed: count <= self.max_requests,
            used: count.min(self.max_requests),
            limit: self.max_requests,
            reset,
            retry_after: reset.saturating_sub(now).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub used: u32,
    pub limit: u32,
    /// Unix seconds
    pub reset: u64,
    /// Seconds until reset, at least 1
    pub retry_after: u64,
}

impl RateLimitDecision {
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            used: 0,
            limit: 0,
            reset: 0,
            retry_after: 0,
        }
    }
}

/// Which counter a caller draws from.
pub fn bucket<'a>(user_id: &'a str, ip: &'a str) -> (&'static str, &'a str) {
    if user_id == ANONYMOUS_USER {
        (ANON_PREFIX, ip)
    } else {
        (AUTH_PREFIX, user_id)
    }
}

/// INCR and EXPIREAT in one MULTI/EXEC, so a counter can never outlive its
/// window. The expiry is the window end, the same value on every hit.
fn count_pipeline(window: &FixedWindow, key: &str, now: u64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .expire_at(key, window.reset_at(now) as i64)
        .ignore();
    pipe
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Count one generation against the caller's window.
pub async fn check_rate_limit(
    pool: Option<&RedisPool>,
    user_id: &str,
    ip: &str,
) -> RedisResult<RateLimitDecision> {
    let Some(pool) = pool else {
        return Ok(RateLimitDecision::unlimited());
    };

    let window = FixedWindow::default();
    let now = unix_now();
    let (prefix, identifier) = bucket(user_id, ip);
    let key = window.key(prefix, identifier, now);

    let mut conn = pool.clone();
    let (count,): (u32,) = count_pipeline(&window, &key, now).query_async(&mut conn).await?;

    let decision = window.decide(count, now);
    if !decision.allowed {
        tracing::info!(prefix, count, retry_after = decision.retry_after, "Rate limit exceeded");
    }
    Ok(decision)
}

/// Current usage without consuming a request.
pub async fn get_usage(pool: Option<&RedisPool>, user_id: &str, ip: &str) -> RedisResult<UsageInfo> {
    let Some(pool) = pool else {
        return Ok(UsageInfo {
            used: 0,
            limit: 0,
            reset: 0,
        });
    };

    let window = FixedWindow::default();
    let now = unix_now();
    let (prefix, identifier) = bucket(user_id, ip);

    let mut conn = pool.clone();
    let count: Option<u32> = conn.get(window.key(prefix, identifier, now)).await?;

    Ok(UsageInfo {
        used: count.unwrap_or(0).min(window.max_requests),
        limit: window.max_requests,
        reset: window.reset_at(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_selection() {
        assert_eq!(bucket("anonymous", "1.2.3.4"), (ANON_PREFIX, "1.2.3.4"));
        assert_eq!(bucket("user_123", "1.2.3.4"), (AUTH_PREFIX, "user_123"));
    }

    #[test]
    fn test_window_key_and_reset() {
        let w = FixedWindow::default();
        let now = 86_400 * 20_000 + 500;
        assert_eq!(w.key(ANON_PREFIX, "1.2.3.4", now), "ratelimit:anon:1.2.3.4:20000");
        assert_eq!(w.reset_at(now), 86_400 * 20_001);
    }

    #[test]
    fn test_decide_allows_up_to_limit() {
        let w = FixedWindow::default();
        let now = 86_400 * 10 + 100;
        for count in 1..=3 {
            let d = w.decide(count, now);
            assert!(d.allowed);
            assert_eq!(d.used, count);
        }
        let d = w.decide(4, now);
        assert!(!d.allowed);
        assert_eq!(d.used, 3);
        assert_eq!(d.retry_after, 86_400 - 100);
    }

    #[test]
    fn test_retry_after_is_at_least_one() {
        let w = FixedWindow::default();
        let now = 86_400 * 11 - 1;
        assert_eq!(w.decide(9, now).retry_after, 1);
        let exact = 86_400 * 11;
        assert!(w.decide(9, exact).retry_after >= 1);
    }

    #[test]
    fn test_count_pipeline_is_atomic() {
        let w = FixedWindow::default();
        let now = 86_400 * 20_000 + 500;
        let packed = count_pipeline(&w, "ratelimit:anon:1.2.3.4:20000", now).get_packed_pipeline();
        let text = String::from_utf8_lossy(&packed);

        let order: Vec<usize> = ["MULTI", "INCR", "EXPIREAT", "EXEC"]
            .iter()
            .map(|cmd| text.find(&format!("\r\n{}\r\n", cmd)).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{}", text);
        assert!(text.contains(&(86_400u64 * 20_001).to_string()));
    }

    #[tokio::test]
    async fn test_without_pool() {
        let d = check_rate_limit(None, "anonymous", "127.0.0.1").await.unwrap();
        assert!(d.allowed);
        let usage = get_usage(None, "anonymous", "127.0.0.1").await.unwrap();
        assert_eq!((usage.used, usage.limit, usage.reset), (0, 0, 0));
    }
}
