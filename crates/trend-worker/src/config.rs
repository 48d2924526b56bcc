//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Dedup cache capacity (candidate keys remembered)
    pub dedup_capacity: usize,
    /// Unseen catalog titles required before the catalog pool is broadened
    pub min_unseen: usize,
    /// Number of top-ranked unseen candidates the final pick chooses from
    pub shortlist_size: usize,
    /// Wall-clock bound on one `generate_poster` call
    pub pipeline_deadline: Duration,
    /// Timeout for a single asset URL attempt
    pub asset_timeout: Duration,
    /// Budget shared by all URL variants of one asset
    pub asset_budget: Duration,
    /// Extra font directory loaded by the compositor
    pub font_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: 100,
            min_unseen: 5,
            shortlist_size: 10,
            pipeline_deadline: Duration::from_secs(90),
            asset_timeout: Duration::from_secs(12),
            asset_budget: Duration::from_secs(30),
            font_dir: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            dedup_capacity: env_parse("DEDUP_CAPACITY").unwrap_or(100),
            min_unseen: env_parse("MIN_UNSEEN").unwrap_or(5),
            shortlist_size: env_parse("SHORTLIST_SIZE").unwrap_or(10),
            pipeline_deadline: Duration::from_secs(env_parse("PIPELINE_DEADLINE_SECS").unwrap_or(90)),
            asset_timeout: Duration::from_secs(env_parse("ASSET_TIMEOUT_SECS").unwrap_or(12)),
            asset_budget: Duration::from_secs(env_parse("ASSET_BUDGET_SECS").unwrap_or(30)),
            font_dir: non_empty_env("FONT_DIR").map(PathBuf::from),
        }
    }
}

/// Generative copy backend configuration.
#[derive(Debug, Clone)]
pub struct CopyConfig {
    /// Gemini API key; copy falls back to templates when unset
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Models tried in order until one answers
    pub models: Vec<String>,
    pub temperature: f32,
    /// Maximum output tokens
    pub max_length: u32,
    pub timeout: Duration,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            models: default_models(),
            temperature: 0.8,
            max_length: 256,
            timeout: Duration::from_secs(15),
        }
    }
}

fn default_models() -> Vec<String> {
    ["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.0-flash"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl CopyConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: non_empty_env("GEMINI_API_KEY"),
            gemini_base_url: non_empty_env("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            models: non_empty_env("GEMINI_MODELS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.models),
            temperature: env_parse("COPY_TEMPERATURE").unwrap_or(defaults.temperature),
            max_length: env_parse("COPY_MAX_TOKENS").unwrap_or(defaults.max_length),
            timeout: Duration::from_secs(env_parse("COPY_TIMEOUT_SECS").unwrap_or(15)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.dedup_capacity, 100);
        assert_eq!(config.min_unseen, 5);
        assert_eq!(config.pipeline_deadline, Duration::from_secs(90));
        assert!(config.asset_timeout < config.asset_budget);
    }

    #[test]
    fn test_copy_defaults() {
        let config = CopyConfig::default();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.max_length, 256);
    }
}
