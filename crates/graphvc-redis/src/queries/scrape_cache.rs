//! One-hour cache of scraped page text, keyed by normalized URL.

use redis::AsyncCommands;
use sha2::{Digest, Sha256};

use crate::client::{RedisPool, RedisResult};

pub const CACHE_TTL_SECS: u64 = 3600;

/// `scrape:<sha256 of the trimmed, lowercased URL without trailing slashes>`
pub fn cache_key(url: &str) -> String {
    let normalized = url.trim().to_lowercase();
    let normalized = normalized.trim_end_matches('/');
    format!("scrape:{}", hex::encode(Sha256::digest(normalized.as_bytes())))
}

/// Seconds since the entry was written, derived from its remaining TTL.
pub fn age_from_ttl(ttl: i64) -> Option<u64> {
    if ttl > 0 {
        Some(CACHE_TTL_SECS.saturating_sub(ttl as u64))
    } else {
        None
    }
}

/// Cached text for `url` and its age in seconds.
pub async fn get_cached_scrape(
    pool: Option<&RedisPool>,
    url: &str,
) -> RedisResult<(Option<String>, Option<u64>)> {
    let Some(pool) = pool else {
        return Ok((None, None));
    };

    let key = cache_key(url);
    let mut conn = pool.clone();
    let text: Option<String> = conn.get(&key).await?;
    let Some(text) = text else {
        return Ok((None, None));
    };

    let ttl: i64 = conn.ttl(&key).await?;
    tracing::debug!(key = %key, ttl, "Scrape cache hit");
    Ok((Some(text), age_from_ttl(ttl)))
}

/// Store scraped text for an hour.
pub async fn cache_scrape(pool: Option<&RedisPool>, url: &str, text: &str) -> RedisResult<()> {
    let Some(pool) = pool else {
        return Ok(());
    };

    let mut conn = pool.clone();
    conn.set_ex::<_, _, ()>(cache_key(url), text, CACHE_TTL_SECS).await?;
    Ok(())
}
