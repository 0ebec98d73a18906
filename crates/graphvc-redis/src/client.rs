//! Redis connection management.

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedisError {
    #[error("Redis error: {0}")]
    Connection(#[from] redis::RedisError),
}

pub type RedisResult<T> = Result<T, RedisError>;

/// ConnectionManager multiplexes internally and is Clone, so callers clone
/// it to get a mutable handle for each operation.
pub type RedisPool = ConnectionManager;

/// Cache and limiter calls sit on the request path; a slow Redis must not
/// stall generation.
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connect to Redis and check it answers.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_pool(redis_url: &str) -> RedisResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let config = ConnectionManagerConfig::new()
        .set_connection_timeout(CONNECT_TIMEOUT)
        .set_response_timeout(RESPONSE_TIMEOUT)
        .set_number_of_retries(2);
    let mut manager = ConnectionManager::new_with_config(client, config).await?;

    let _: String = redis::cmd("PING").query_async(&mut manager).await?;
    tracing::info!(host = %redacted_host(redis_url), "Connected to Redis");
    Ok(manager)
}

/// Host part of a Redis URL, without credentials.
fn redacted_host(redis_url: &str) -> &str {
    let rest = redis_url.split_once("://").map_or(redis_url, |(_, rest)| rest);
    let rest = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
    rest.split('/').next().unwrap_or(rest)
}
