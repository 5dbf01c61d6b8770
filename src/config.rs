use std::env;

use crate::pagination::{DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Shop backend
    pub shop_api_base_url: String,
    pub shop_api_timeout_seconds: u64,

    // Console server
    pub console_host: String,
    pub console_port: u16,
    pub max_request_bytes: usize,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: u64,
    pub preview_idle_seconds: u64,

    // Presentation
    pub default_page_size: usize,
    pub entry_id_prefix: String,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let shop_api_base_url = env::var("SHOP_API_BASE_URL")
            .map_err(|_| ConfigError::Missing("SHOP_API_BASE_URL"))?;

        let default_page_size = env::var("DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if !PAGE_SIZE_CHOICES.contains(&default_page_size) {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_PAGE_SIZE",
                reason: format!("must be one of {PAGE_SIZE_CHOICES:?}"),
            });
        }

        Ok(Self {
            // Shop backend
            shop_api_base_url: shop_api_base_url.trim_end_matches('/').to_string(),
            shop_api_timeout_seconds: env::var("SHOP_API_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Console server
            console_host: env::var("CONSOLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            console_port: env::var("CONSOLE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            max_request_bytes: env::var("MAX_REQUEST_BYTES")
                .unwrap_or_else(|_| "67108864".to_string())
                .parse()
                .unwrap_or(67_108_864), // 64MB, room for several 8MB images

            // Caching
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .unwrap_or(256),
            preview_idle_seconds: env::var("PREVIEW_IDLE_SECONDS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .unwrap_or(1800),

            // Presentation
            default_page_size,
            entry_id_prefix: env::var("ENTRY_ID_PREFIX").unwrap_or_else(|_| "ME-".to_string()),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    /// Configuration pointing at `shop_api_base_url` with every other value at
    /// its default. Used by tests and tooling that never read the environment.
    #[must_use]
    pub fn with_base_url(shop_api_base_url: impl Into<String>) -> Self {
        let base: String = shop_api_base_url.into();
        Self {
            shop_api_base_url: base.trim_end_matches('/').to_string(),
            shop_api_timeout_seconds: 30,
            console_host: "127.0.0.1".to_string(),
            console_port: 3000,
            max_request_bytes: 67_108_864,
            cache_ttl_seconds: 300,
            cache_max_entries: 256,
            preview_idle_seconds: 1800,
            default_page_size: DEFAULT_PAGE_SIZE,
            entry_id_prefix: "ME-".to_string(),
            deployment: Deployment::Local,
        }
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.console_host, self.console_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
