//! GraphVC Redis layer
//!
//! Scrape cache and fixed-window rate limiting. Every operation takes an
//! optional pool: without Redis the cache misses and the limiter allows.

pub mod client;
pub mod queries;

pub use client::{init_pool, RedisError, RedisPool, RedisResult};
pub use queries::ratelimit::{self, FixedWindow, RateLimitDecision};
pub use queries::scrape_cache;
