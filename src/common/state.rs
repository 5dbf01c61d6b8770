use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{PreviewStore, Queries, QueryCache};
use crate::shop::ShopClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queries: Queries,
    pub previews: PreviewStore,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the shop client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let shop = ShopClient::new(&config)?;
        let cache = QueryCache::new(&config);
        let previews = PreviewStore::new(&config);

        Ok(Self {
            queries: Queries::new(Arc::new(shop), cache),
            previews,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        self.queries.cache()
    }
}
