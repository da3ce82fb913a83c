use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Steam-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for detail and image requests (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for the single listing request (seconds)
    #[serde(rename = "listing-timeout-secs", default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            listing_timeout_secs: default_listing_timeout(),
        }
    }
}

/// Destination store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Retry and backoff tuning for one crawl type
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay multiplied by `backoff-factor^attempt` (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,
}

/// Catalog (app details) crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Endpoint returning `{"applist": {"apps": [...]}}`
    #[serde(rename = "listing-url", default = "default_listing_url")]
    pub listing_url: String,

    /// Endpoint queried with `appids`, `l` and `cc` parameters
    #[serde(rename = "detail-url", default = "default_detail_url")]
    pub detail_url: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_country")]
    pub country: String,

    /// JSON file holding `next_index` and `processed_appids`
    #[serde(rename = "checkpoint-path", default = "default_catalog_checkpoint")]
    pub checkpoint_path: String,

    /// Delay between handled items (milliseconds)
    #[serde(rename = "pacing-ms", default = "default_catalog_pacing")]
    pub pacing_ms: u64,

    #[serde(default = "default_catalog_retry")]
    pub retry: RetryConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            detail_url: default_detail_url(),
            language: default_language(),
            country: default_country(),
            checkpoint_path: default_catalog_checkpoint(),
            pacing_ms: default_catalog_pacing(),
            retry: default_catalog_retry(),
        }
    }
}

/// Header image download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    /// Directory receiving `<appid>.jpg` files
    #[serde(default = "default_images_dir")]
    pub directory: String,

    /// JSON file holding the `downloaded` array
    #[serde(rename = "checkpoint-path", default = "default_images_checkpoint")]
    pub checkpoint_path: String,

    #[serde(rename = "pacing-ms", default = "default_images_pacing")]
    pub pacing_ms: u64,

    #[serde(default = "default_images_retry")]
    pub retry: RetryConfig,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            directory: default_images_dir(),
            checkpoint_path: default_images_checkpoint(),
            pacing_ms: default_images_pacing(),
            retry: default_images_retry(),
        }
    }
}

fn default_user_agent() -> String {
    format!("steam-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    20
}

fn default_listing_timeout() -> u64 {
    30
}

fn default_listing_url() -> String {
    "https://api.steampowered.com/ISteamApps/GetAppList/v2/".to_string()
}

fn default_detail_url() -> String {
    "https://store.steampowered.com/api/appdetails".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_catalog_checkpoint() -> String {
    "./populate_progress.json".to_string()
}

fn default_catalog_pacing() -> u64 {
    300
}

fn default_catalog_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 5,
        initial_delay_ms: 300,
        backoff_factor: 1.8,
    }
}

fn default_images_dir() -> String {
    "./images".to_string()
}

fn default_images_checkpoint() -> String {
    "./image_progress.json".to_string()
}

fn default_images_pacing() -> u64 {
    500
}

fn default_images_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 4,
        initial_delay_ms: 500,
        backoff_factor: 1.6,
    }
}
