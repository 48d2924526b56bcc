//! Web image search adapter (Google Custom Search JSON API).
//!
//! Builds a query from the trending keyword plus a category-specific phrase
//! and normalizes image results into candidates titled after the keyword.

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use trend_models::{Candidate, CandidateMetadata, Category, SourceType};

use crate::config::SourcesConfig;
use crate::error::{SourceError, SourceResult};
use crate::http::ProviderHttp;
use crate::provider::{ResolveContext, SourceProvider};

const PROVIDER: &str = "image_search";

/// Minimum height/width ratio accepted for poster-shaped categories.
const POSTER_MIN_ASPECT: f32 = 1.2;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    mime: Option<String>,
    #[serde(rename = "displayLink")]
    display_link: Option<String>,
    image: Option<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    width: Option<u32>,
    height: Option<u32>,
}

impl SearchItem {
    fn aspect(&self) -> Option<f32> {
        let info = self.image.as_ref()?;
        match (info.width, info.height) {
            (Some(w), Some(h)) if w > 0 => Some(h as f32 / w as f32),
            _ => None,
        }
    }

    fn is_markup(&self) -> bool {
        self.mime
            .as_deref()
            .is_some_and(|m| m.contains("svg") || m.contains("html") || m.contains("xml"))
    }
}

/// Category-specific phrases appended to the trending keyword.
pub fn phrase_templates(category: Category) -> &'static [&'static str] {
    match category {
        Category::Movies => &["movie poster", "official poster", "film key art"],
        Category::TvShows => &["tv series poster", "season poster", "series key art"],
        Category::Sports => &["stadium match photo", "football match action"],
        Category::Recipes => &["food photo", "homemade recipe dish", "plated food photography"],
        Category::Gaming => &["video game key art", "game screenshot"],
        Category::Apps => &["app screenshot", "mobile app interface"],
        Category::TvChannels => &["tv channel logo", "tv channel studio"],
    }
}

/// Search query for `keyword`. The phrase rotates by day of year.
pub fn build_query(category: Category, keyword: &str, ctx: &ResolveContext) -> String {
    let phrases = phrase_templates(category);
    let phrase = phrases[ctx.date.ordinal0() as usize % phrases.len()];
    format!("{} {}", keyword.trim(), phrase)
}

/// Stable short id derived from an image URL.
fn link_id(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Google Custom Search image adapter.
pub struct ImageSearch {
    http: ProviderHttp,
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
}

impl ImageSearch {
    pub fn new(config: &SourcesConfig) -> SourceResult<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, config.request_timeout)?,
            api_key: config.search_api_key.clone(),
            engine_id: config.search_engine_id.clone(),
            base_url: config.search_base_url.clone(),
        })
    }

    fn credentials(&self) -> SourceResult<(&str, &str)> {
        match (self.api_key.as_deref(), self.engine_id.as_deref()) {
            (Some(key), Some(cx)) => Ok((key, cx)),
            _ => Err(SourceError::unavailable(
                "GOOGLE_SEARCH_API_KEY / GOOGLE_SEARCH_ENGINE_ID not set",
            )),
        }
    }
}

#[async_trait]
impl SourceProvider for ImageSearch {
    fn name(&self) -> &'static str {
        "image_search"
    }

    async fn resolve(&self, category: Category, ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        let (key, cx) = self.credentials()?;
        let keyword = ctx
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SourceError::unavailable("no trending keyword for image search"))?;

        let query = build_query(category, keyword, ctx);
        debug!(category = %category, query = %query, "Searching images");

        let request = self.http.client().get(&self.base_url).query(&[
            ("key", key),
            ("cx", cx),
            ("q", query.as_str()),
            ("searchType", "image"),
            ("imgSize", "xlarge"),
            ("safe", "active"),
            ("num", "10"),
        ]);
        let response: SearchResponse = self.http.send_json(request).await?;

        let items: Vec<SearchItem> = response.items.into_iter().filter(|i| !i.is_markup()).collect();

        let items = if category.prefers_poster_aspect() {
            let (portrait, other): (Vec<_>, Vec<_>) = items
                .into_iter()
                .partition(|i| i.aspect().is_some_and(|a| a >= POSTER_MIN_ASPECT));
            if portrait.is_empty() {
                other
            } else {
                portrait
            }
        } else {
            items
        };

        Ok(items
            .into_iter()
            .map(|item| {
                let metadata = CandidateMetadata {
                    origin: item.display_link.clone(),
                    ..Default::default()
                };
                Candidate::new(SourceType::ImageSearch, link_id(&item.link), keyword)
                    .with_image(item.link)
                    .with_metadata(metadata)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> ResolveContext {
        ResolveContext::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).with_keyword("Dune Part Two")
    }

    fn config(server: &MockServer) -> SourcesConfig {
        SourcesConfig {
            search_api_key: Some("k".into()),
            search_engine_id: Some("cx".into()),
            search_base_url: server.uri(),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_uses_category_phrase() {
        let query = build_query(Category::Recipes, " Pumpkin Soup ", &ctx());
        assert_eq!(query, "Pumpkin Soup food photo");
    }

    #[tokio::test]
    async fn test_poster_categories_filter_by_aspect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Dune Part Two movie poster"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "link": "https://a.test/wide.jpg", "mime": "image/jpeg", "image": { "width": 1920, "height": 1080 } },
                    { "link": "https://a.test/tall.jpg", "mime": "image/jpeg", "image": { "width": 1000, "height": 1500 } },
                    { "link": "https://a.test/logo.svg", "mime": "image/svg+xml", "image": { "width": 100, "height": 200 } }
                ]
            })))
            .mount(&server)
            .await;

        let search = ImageSearch::new(&config(&server)).unwrap();
        let pool = search.resolve(Category::Movies, &ctx()).await.unwrap();

        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].image_ref.as_deref(), Some("https://a.test/tall.jpg"));
        assert_eq!(pool[0].title, "Dune Part Two");
        assert_eq!(pool[0].id.len(), 16);
    }

    #[tokio::test]
    async fn test_missing_keyword_is_unavailable() {
        let server = MockServer::start().await;
        let search = ImageSearch::new(&config(&server)).unwrap();
        let ctx = ResolveContext::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(search.resolve(Category::Recipes, &ctx).await.unwrap_err().is_unavailable());
    }
}
