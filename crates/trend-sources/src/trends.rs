//! Trending keyword sources.
//!
//! [`TrendingKeywords`] reads Google Trends "trending now" through SerpApi.
//! [`SeedKeywords`] is a static per-category list used whenever the live
//! source is unavailable or returns nothing.

use async_trait::async_trait;
use serde::Deserialize;
use trend_models::Category;

use crate::config::SourcesConfig;
use crate::error::{SourceError, SourceResult};
use crate::http::ProviderHttp;
use crate::provider::KeywordSource;

const PROVIDER: &str = "serpapi";

/// Google Trends category id for a poster category.
pub fn trends_category_id(category: Category) -> &'static str {
    match category {
        Category::Movies | Category::TvShows | Category::TvChannels => "4",
        Category::Recipes => "5",
        Category::Gaming => "6",
        Category::Sports => "17",
        Category::Apps => "18",
    }
}

#[derive(Debug, Deserialize)]
struct TrendingNowResponse {
    #[serde(default)]
    trending_searches: Vec<TrendingSearch>,
}

#[derive(Debug, Deserialize)]
struct TrendingSearch {
    query: String,
}

/// SerpApi Google Trends keyword source.
pub struct TrendingKeywords {
    http: ProviderHttp,
    api_key: Option<String>,
    base_url: String,
    geo: String,
}

impl TrendingKeywords {
    pub fn new(config: &SourcesConfig) -> SourceResult<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, config.request_timeout)?,
            api_key: config.serpapi_key.clone(),
            base_url: config.serpapi_base_url.trim_end_matches('/').to_string(),
            geo: config.trends_geo.clone(),
        })
    }
}

#[async_trait]
impl KeywordSource for TrendingKeywords {
    fn name(&self) -> &'static str {
        "google_trends"
    }

    async fn trending_keywords(&self, category: Category) -> SourceResult<Vec<String>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::unavailable("SERPAPI_KEY not set"))?;

        let url = format!("{}/search.json", self.base_url);
        let request = self.http.client().get(&url).query(&[
            ("engine", "google_trends_trending_now"),
            ("geo", self.geo.as_str()),
            ("category_id", trends_category_id(category)),
            ("api_key", key),
        ]);
        let response: TrendingNowResponse = self.http.send_json(request).await?;

        let mut keywords: Vec<String> = Vec::new();
        for search in response.trending_searches {
            let query = search.query.trim();
            if !query.is_empty() && !keywords.iter().any(|k| k.eq_ignore_ascii_case(query)) {
                keywords.push(query.to_string());
            }
        }
        Ok(keywords)
    }
}

/// Static seed keywords. Never fails and never returns an empty list.
#[derive(Debug, Default, Clone)]
pub struct SeedKeywords;

impl SeedKeywords {
    pub fn seeds(category: Category) -> &'static [&'static str] {
        match category {
            Category::Movies => &["Dune", "Oppenheimer", "Inside Out", "Gladiator", "Wicked"],
            Category::TvShows => &["The Bear", "Shogun", "House of the Dragon", "The Last of Us"],
            Category::Sports => &["Champions League", "El Clasico", "Premier League"],
            Category::Recipes => &[
                "Pumpkin Soup",
                "Chicken Tikka Masala",
                "Banana Bread",
                "Paella",
                "Ramen",
                "Tacos al Pastor",
            ],
            Category::Gaming => &["Minecraft", "Roblox", "Genshin Impact", "Clash Royale"],
            Category::Apps => &["ChatGPT", "Duolingo", "CapCut", "Spotify", "Threads"],
            Category::TvChannels => &["ESPN", "HBO", "BBC One", "Discovery Channel", "Telemundo"],
        }
    }
}

#[async_trait]
impl KeywordSource for SeedKeywords {
    fn name(&self) -> &'static str {
        "seed_keywords"
    }

    async fn trending_keywords(&self, category: Category) -> SourceResult<Vec<String>> {
        Ok(Self::seeds(category).iter().map(|s| s.to_string()).collect())
    }
}
