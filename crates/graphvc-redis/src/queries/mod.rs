//! Redis-backed queries.

pub mod ratelimit;
pub mod scrape_cache;
