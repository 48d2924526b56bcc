//! TMDB metadata catalog adapter (movies and TV shows).
//!
//! Resolution queries the daily trending endpoint first. When fewer than
//! `min_unseen` trending titles are unseen, the pool is broadened with the
//! ratings-sorted discover endpoint across several regions, merged and
//! deduplicated by id.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};
use trend_models::{Candidate, CandidateMetadata, Category, SourceType};

use crate::config::SourcesConfig;
use crate::error::{SourceError, SourceResult};
use crate::http::ProviderHttp;
use crate::provider::{ResolveContext, SourceProvider};

const PROVIDER: &str = "tmdb";

/// Minimum number of unseen trending titles before broadening.
pub const DEFAULT_MIN_UNSEEN: usize = 5;

/// Minimum vote count for discover results, keeps obscure titles out.
const DISCOVER_MIN_VOTES: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Movies => Some(MediaKind::Movie),
            Category::TvShows => Some(MediaKind::Tv),
            _ => None,
        }
    }

    fn path_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaginatedResponse {
    #[serde(default)]
    results: Vec<TmdbItem>,
}

#[derive(Debug, Deserialize)]
struct TmdbItem {
    id: u64,
    /// Movies
    title: Option<String>,
    /// TV shows
    name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    popularity: Option<f64>,
    original_language: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u32>,
}

/// TMDB trending/discover adapter.
pub struct TmdbCatalog {
    http: ProviderHttp,
    api_key: Option<String>,
    base_url: String,
    image_base_url: String,
    regions: Vec<String>,
    min_unseen: usize,
}

impl TmdbCatalog {
    pub fn new(config: &SourcesConfig) -> SourceResult<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, config.request_timeout)?,
            api_key: config.tmdb_api_key.clone(),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            image_base_url: config.tmdb_image_base_url.trim_end_matches('/').to_string(),
            regions: config.discover_regions.clone(),
            min_unseen: DEFAULT_MIN_UNSEEN,
        })
    }

    pub fn with_min_unseen(mut self, min_unseen: usize) -> Self {
        self.min_unseen = min_unseen;
        self
    }

    fn api_key(&self) -> SourceResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SourceError::unavailable("TMDB_API_KEY not set"))
    }

    async fn trending(&self, kind: MediaKind) -> SourceResult<Vec<TmdbItem>> {
        let url = format!("{}/trending/{}/day", self.base_url, kind.path_segment());
        let request = self
            .http
            .client()
            .get(&url)
            .query(&[("api_key", self.api_key()?), ("language", "en-US")]);

        let page: PaginatedResponse = self.http.send_json(request).await?;
        Ok(page.results)
    }

    async fn discover(&self, kind: MediaKind, region: &str) -> SourceResult<Vec<TmdbItem>> {
        let url = format!("{}/discover/{}", self.base_url, kind.path_segment());
        let min_votes = DISCOVER_MIN_VOTES.to_string();
        let request = self.http.client().get(&url).query(&[
            ("api_key", self.api_key()?),
            ("language", "en-US"),
            ("sort_by", "vote_average.desc"),
            ("vote_count.gte", min_votes.as_str()),
            ("region", region),
            ("watch_region", region),
        ]);

        let page: PaginatedResponse = self.http.send_json(request).await?;
        Ok(page.results)
    }

    /// Query discover for every configured region concurrently.
    async fn discover_all_regions(&self, kind: MediaKind) -> Vec<TmdbItem> {
        let results = join_all(self.regions.iter().map(|region| self.discover(kind, region))).await;

        let mut items = Vec::new();
        for (region, result) in self.regions.iter().zip(results) {
            match result {
                Ok(mut found) => {
                    debug!(region = %region, count = found.len(), "TMDB discover results");
                    items.append(&mut found);
                }
                Err(e) => warn!(region = %region, "TMDB discover failed: {}", e),
            }
        }
        items
    }

    fn to_candidate(&self, item: TmdbItem) -> Option<Candidate> {
        let title = item.title.or(item.name)?.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let poster = item
            .poster_path
            .as_deref()
            .map(|p| format!("{}/original{}", self.image_base_url, p));
        let backdrop = item
            .backdrop_path
            .as_deref()
            .map(|p| format!("{}/original{}", self.image_base_url, p));

        // Titles without any artwork still qualify; the fetcher synthesizes a placeholder.
        let (image_ref, alt_image_refs) = match (poster, backdrop) {
            (Some(poster), Some(backdrop)) => (Some(poster), vec![backdrop]),
            (Some(poster), None) => (Some(poster), Vec::new()),
            (None, backdrop) => (backdrop, Vec::new()),
        };

        let metadata = CandidateMetadata {
            rating: item.vote_average.filter(|r| *r > 0.0),
            popularity: item.popularity,
            origin: item.original_language.map(|l| l.to_uppercase()),
            genre: item.genre_ids.iter().find_map(|id| genre_name(*id)).map(str::to_string),
            alt_image_refs,
            ..Default::default()
        };

        Some(Candidate {
            id: item.id.to_string(),
            source_type: SourceType::Tmdb,
            title,
            image_ref,
            metadata,
        })
    }

    fn merge(&self, pool: &mut Vec<Candidate>, ids: &mut HashSet<String>, items: Vec<TmdbItem>) {
        for item in items {
            if ids.contains(&item.id.to_string()) {
                continue;
            }
            if let Some(candidate) = self.to_candidate(item) {
                ids.insert(candidate.id.clone());
                pool.push(candidate);
            }
        }
    }
}

#[async_trait]
impl SourceProvider for TmdbCatalog {
    fn name(&self) -> &'static str {
        "tmdb_catalog"
    }

    async fn resolve(&self, category: Category, ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        let kind = MediaKind::for_category(category).ok_or_else(|| {
            SourceError::unavailable(format!("TMDB does not serve category {category}"))
        })?;
        self.api_key()?;

        let mut pool = Vec::new();
        let mut ids = HashSet::new();

        let trending_error = match self.trending(kind).await {
            Ok(items) => {
                self.merge(&mut pool, &mut ids, items);
                None
            }
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => {
                warn!(category = %category, "TMDB trending failed, broadening: {}", e);
                Some(e)
            }
        };

        let unseen = ctx.unseen_count(&pool);
        if unseen < self.min_unseen {
            info!(
                category = %category,
                unseen,
                threshold = self.min_unseen,
                "Broadening TMDB pool with discover"
            );
            let discovered = self.discover_all_regions(kind).await;
            self.merge(&mut pool, &mut ids, discovered);
        }

        match (pool.is_empty(), trending_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(pool),
        }
    }
}

fn genre_name(id: u32) -> Option<&'static str> {
    let name = match id {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        27 => "Horror",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Sci-Fi",
        53 => "Thriller",
        10759 => "Action & Adventure",
        10765 => "Sci-Fi & Fantasy",
        10764 => "Reality",
        _ => return None,
    };
    Some(name)
}
