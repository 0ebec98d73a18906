//! Application state.

use std::sync::Arc;

use graphvc_db::DbPool;
use graphvc_extract::{GraphExtractor, Scraper};
use graphvc_graph::GraphRepository;
use graphvc_redis::RedisPool;

/// Shared across handlers. Redis and the history database are optional:
/// without Redis nothing is cached or limited, without the history
/// database the history endpoints answer 503.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn GraphExtractor>,
    pub scraper: Arc<Scraper>,
    pub graphs: Arc<dyn GraphRepository>,
    pub history: Option<DbPool>,
    pub redis: Option<RedisPool>,
}

impl AppState {
    pub fn new(extractor: Arc<dyn GraphExtractor>, graphs: Arc<dyn GraphRepository>) -> Self {
        Self {
            extractor,
            scraper: Arc::new(Scraper::default()),
            graphs,
            history: None,
            redis: None,
        }
    }

    pub fn with_scraper(mut self, scraper: Scraper) -> Self {
        self.scraper = Arc::new(scraper);
        self
    }

    pub fn with_history(mut self, history: DbPool) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_redis(mut self, redis: RedisPool) -> Self {
        self.redis = Some(redis);
        self
    }
}
