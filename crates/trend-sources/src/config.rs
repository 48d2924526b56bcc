//! Source provider configuration.

use std::time::Duration;

/// Credentials and endpoints for every upstream source.
///
/// Constructed once at process start and shared by reference. A missing
/// credential disables only the provider that needs it.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    /// Regions queried when broadening the TMDB pool
    pub discover_regions: Vec<String>,
    /// Google Custom Search JSON API key
    pub search_api_key: Option<String>,
    /// Google Programmable Search engine id (`cx`)
    pub search_engine_id: Option<String>,
    pub search_base_url: String,
    /// API-Football key
    pub sports_api_key: Option<String>,
    pub sports_base_url: String,
    pub app_store_base_url: String,
    pub app_store_country: String,
    /// SerpApi key for trending keywords
    pub serpapi_key: Option<String>,
    pub serpapi_base_url: String,
    pub trends_geo: String,
    /// Timeout applied to every provider request
    pub request_timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_image_base_url: "https://image.tmdb.org/t/p".to_string(),
            discover_regions: default_regions(),
            search_api_key: None,
            search_engine_id: None,
            search_base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            sports_api_key: None,
            sports_base_url: "https://v3.football.api-sports.io".to_string(),
            app_store_base_url: "https://itunes.apple.com".to_string(),
            app_store_country: "us".to_string(),
            serpapi_key: None,
            serpapi_base_url: "https://serpapi.com".to_string(),
            trends_geo: "US".to_string(),
            request_timeout: Duration::from_secs(12),
        }
    }
}

fn default_regions() -> Vec<String> {
    ["US", "GB", "ES", "MX", "FR"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl SourcesConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tmdb_api_key: non_empty_env("TMDB_API_KEY"),
            tmdb_base_url: non_empty_env("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url),
            tmdb_image_base_url: non_empty_env("TMDB_IMAGE_BASE_URL")
                .unwrap_or(defaults.tmdb_image_base_url),
            discover_regions: non_empty_env("TMDB_DISCOVER_REGIONS")
                .map(|s| s.split(',').map(|r| r.trim().to_uppercase()).collect())
                .unwrap_or(defaults.discover_regions),
            search_api_key: non_empty_env("GOOGLE_SEARCH_API_KEY"),
            search_engine_id: non_empty_env("GOOGLE_SEARCH_ENGINE_ID"),
            search_base_url: non_empty_env("GOOGLE_SEARCH_BASE_URL")
                .unwrap_or(defaults.search_base_url),
            sports_api_key: non_empty_env("API_FOOTBALL_KEY"),
            sports_base_url: non_empty_env("API_FOOTBALL_BASE_URL")
                .unwrap_or(defaults.sports_base_url),
            app_store_base_url: non_empty_env("APP_STORE_BASE_URL")
                .unwrap_or(defaults.app_store_base_url),
            app_store_country: non_empty_env("APP_STORE_COUNTRY")
                .unwrap_or(defaults.app_store_country),
            serpapi_key: non_empty_env("SERPAPI_KEY"),
            serpapi_base_url: non_empty_env("SERPAPI_BASE_URL")
                .unwrap_or(defaults.serpapi_base_url),
            trends_geo: non_empty_env("TRENDS_GEO").unwrap_or(defaults.trends_geo),
            request_timeout: Duration::from_secs(
                std::env::var("SOURCE_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(12),
            ),
        }
    }
}
