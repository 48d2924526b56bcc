//! App-store listing adapter (iTunes Search API).
//!
//! Returns the ranked top of a software search. The final pick among the
//! shortlist is popularity-weighted and happens in [`weighted_index`].

use async_trait::async_trait;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use serde::Deserialize;
use trend_models::{Candidate, CandidateMetadata, Category, SourceType};

use crate::config::SourcesConfig;
use crate::error::{SourceError, SourceResult};
use crate::http::ProviderHttp;
use crate::provider::{ResolveContext, SourceProvider};

const PROVIDER: &str = "app_store";

/// iTunes genre id for games.
const GAMES_GENRE_ID: &str = "6014";

/// Number of ranked results requested from the store.
const RESULT_LIMIT: &str = "25";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<StoreItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreItem {
    track_id: u64,
    track_name: String,
    artwork_url512: Option<String>,
    artwork_url100: Option<String>,
    #[serde(default)]
    screenshot_urls: Vec<String>,
    #[serde(default)]
    ipad_screenshot_urls: Vec<String>,
    average_user_rating: Option<f32>,
    user_rating_count: Option<u64>,
    seller_name: Option<String>,
    primary_genre_name: Option<String>,
}

impl StoreItem {
    fn into_candidate(self) -> Candidate {
        let mut screenshots = self.screenshot_urls;
        screenshots.extend(self.ipad_screenshot_urls);
        let mut screenshots = screenshots.into_iter();
        let image_ref = screenshots.next();

        let (icon_ref, alt_icon_refs) = match (self.artwork_url512, self.artwork_url100) {
            (Some(large), small) => (Some(large), small.into_iter().collect()),
            (None, small) => (small, Vec::new()),
        };

        let metadata = CandidateMetadata {
            // Store ratings are 0-5; the model uses a 0-10 scale.
            rating: self.average_user_rating.map(|r| (r * 2.0 * 10.0).round() / 10.0),
            popularity: self.user_rating_count.map(|c| c as f64),
            origin: self.seller_name,
            genre: self.primary_genre_name,
            icon_ref,
            alt_icon_refs,
            alt_image_refs: screenshots.collect(),
            ..Default::default()
        };

        Candidate {
            id: self.track_id.to_string(),
            source_type: SourceType::AppStore,
            title: self.track_name.trim().to_string(),
            image_ref,
            metadata,
        }
    }
}

/// iTunes Search API adapter for apps and games.
pub struct AppStoreSearch {
    http: ProviderHttp,
    base_url: String,
    country: String,
}

impl AppStoreSearch {
    pub fn new(config: &SourcesConfig) -> SourceResult<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, config.request_timeout)?,
            base_url: config.app_store_base_url.trim_end_matches('/').to_string(),
            country: config.app_store_country.clone(),
        })
    }

    fn default_term(category: Category) -> Option<&'static str> {
        match category {
            Category::Gaming => Some("games"),
            Category::Apps => Some("apps"),
            _ => None,
        }
    }
}

#[async_trait]
impl SourceProvider for AppStoreSearch {
    fn name(&self) -> &'static str {
        "app_store"
    }

    async fn resolve(&self, category: Category, ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        let default_term = Self::default_term(category).ok_or_else(|| {
            SourceError::unavailable(format!("app store does not serve category {category}"))
        })?;
        let term = ctx.keyword.as_deref().unwrap_or(default_term);

        let mut params = vec![
            ("term", term),
            ("entity", "software"),
            ("country", self.country.as_str()),
            ("limit", RESULT_LIMIT),
        ];
        if category == Category::Gaming {
            params.push(("genreId", GAMES_GENRE_ID));
        }

        let url = format!("{}/search", self.base_url);
        let request = self.http.client().get(&url).query(&params);
        let response: SearchResponse = self.http.send_json(request).await?;

        Ok(response
            .results
            .into_iter()
            .filter(|item| !item.track_name.trim().is_empty())
            .map(StoreItem::into_candidate)
            .collect())
    }
}

/// Pick an index among the first `top_n` candidates, weighted toward
/// entries that are already popular.
pub fn weighted_index<R: Rng + ?Sized>(pool: &[Candidate], top_n: usize, rng: &mut R) -> usize {
    let shortlist = &pool[..pool.len().min(top_n.max(1))];
    let weights: Vec<f64> = shortlist
        .iter()
        .map(|c| c.metadata.popularity.unwrap_or(0.0).max(0.0).ln_1p() + 1.0)
        .collect();

    match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> ResolveContext {
        ResolveContext::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[tokio::test]
    async fn test_games_search_normalizes_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("genreId", "6014"))
            .and(query_param("term", "games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultCount": 1,
                "results": [{
                    "trackId": 479516143,
                    "trackName": "Minecraft",
                    "artworkUrl512": "https://is1.test/image/512x512bb.jpg",
                    "artworkUrl100": "https://is1.test/image/100x100bb.jpg",
                    "screenshotUrls": ["https://is1.test/shot1/392x696bb.jpg", "https://is1.test/shot2/392x696bb.jpg"],
                    "averageUserRating": 4.53,
                    "userRatingCount": 612000,
                    "sellerName": "Mojang",
                    "primaryGenreName": "Games"
                }]
            })))
            .mount(&server)
            .await;

        let config = SourcesConfig {
            app_store_base_url: server.uri(),
            ..Default::default()
        };
        let store = AppStoreSearch::new(&config).unwrap();
        let pool = store.resolve(Category::Gaming, &ctx()).await.unwrap();

        assert_eq!(pool.len(), 1);
        let minecraft = &pool[0];
        assert_eq!(minecraft.id, "479516143");
        assert_eq!(minecraft.image_ref.as_deref(), Some("https://is1.test/shot1/392x696bb.jpg"));
        assert_eq!(minecraft.metadata.alt_image_refs.len(), 1);
        assert_eq!(minecraft.metadata.icon_ref.as_deref(), Some("https://is1.test/image/512x512bb.jpg"));
        assert_eq!(minecraft.metadata.rating, Some(9.1));
        assert_eq!(minecraft.metadata.alt_icon_refs, vec!["https://is1.test/image/100x100bb.jpg"]);
    }

    #[test]
    fn test_small_artwork_is_the_icon_when_alone() {
        let item: StoreItem = serde_json::from_value(json!({
            "trackId": 1,
            "trackName": " Duolingo ",
            "artworkUrl100": "https://is1.test/image/100x100bb.jpg"
        }))
        .unwrap();
        let candidate = item.into_candidate();
        assert_eq!(candidate.title, "Duolingo");
        assert_eq!(candidate.metadata.icon_ref.as_deref(), Some("https://is1.test/image/100x100bb.jpg"));
        assert!(candidate.metadata.alt_icon_refs.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_category() {
        let store = AppStoreSearch::new(&SourcesConfig::default()).unwrap();
        assert!(store.resolve(Category::Movies, &ctx()).await.unwrap_err().is_unavailable());
    }

    #[test]
    fn test_weighted_index_stays_in_shortlist() {
        let pool: Vec<_> = (0..30)
            .map(|i| {
                let mut c = Candidate::new(SourceType::AppStore, i.to_string(), format!("App {i}"));
                c.metadata.popularity = Some((30 - i) as f64 * 1000.0);
                c
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(weighted_index(&pool, 10, &mut rng) < 10);
        }
    }
}
