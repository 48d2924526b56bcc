//! Per-category resolution strategies.
//!
//! A [`CategoryStrategy`] owns everything category specific: the fixed
//! fallback tier order, how the final candidate is picked, which URLs feed
//! the background and image slots, and the overlay layout. The
//! [`StrategyRegistry`] maps every [`Category`] to its strategy.

mod catalog;
pub mod layout;
mod search;
mod sports;
mod store;

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use trend_models::{Candidate, Category, OverlaySpec, PromotionalCopy};
use trend_sources::{
    AppStoreSearch, CuratedFixtures, FixtureFeed, ImageSearch, SourceProvider, SourceResult,
    SourcesConfig, TmdbCatalog,
};

use crate::config::WorkerConfig;

pub use catalog::CatalogStrategy;
pub use search::SearchStrategy;
pub use sports::SportsStrategy;
pub use store::StoreStrategy;

/// One fallback tier.
#[derive(Clone)]
pub struct Tier {
    pub provider: Arc<dyn SourceProvider>,
    /// Whether the provider needs a trending keyword in its context
    pub needs_keyword: bool,
}

impl Tier {
    pub fn new(provider: Arc<dyn SourceProvider>) -> Self {
        Self {
            provider,
            needs_keyword: false,
        }
    }

    pub fn with_keyword(provider: Arc<dyn SourceProvider>) -> Self {
        Self {
            provider,
            needs_keyword: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }
}

/// Image URLs to acquire for a chosen candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPlan {
    /// Background URL variants, tried in order
    pub background: Vec<String>,
    /// Slot name and its URL variants
    pub slots: Vec<(String, Vec<String>)>,
    /// Text drawn on a synthesized background
    pub placeholder_title: String,
}

pub trait CategoryStrategy: Send + Sync {
    fn category(&self) -> Category;

    /// Fallback tiers in the order they are tried. Never varies at runtime.
    fn tiers(&self) -> &[Tier];

    /// Annotate a resolved pool before selection.
    fn prepare(&self, _pool: &mut [Candidate], _rng: &mut StdRng) {}

    /// Index into `unseen` (non-empty, ranked best first) of the candidate to use.
    fn pick(&self, unseen: &[Candidate], rng: &mut StdRng) -> usize;

    fn asset_plan(&self, candidate: &Candidate) -> AssetPlan;

    fn overlay(&self, candidate: &Candidate, copy: &PromotionalCopy) -> OverlaySpec;
}

/// Uniform pick among the first `shortlist` entries.
pub fn shortlist_pick(unseen: &[Candidate], shortlist: usize, rng: &mut StdRng) -> usize {
    let bound = unseen.len().min(shortlist).max(1);
    rng.random_range(0..bound)
}

/// `primary` followed by `alternates`, skipping duplicates.
pub(crate) fn with_alternates(primary: Vec<String>, alternates: &[String]) -> Vec<String> {
    let mut urls = primary;
    for url in alternates {
        if !urls.contains(url) {
            urls.push(url.clone());
        }
    }
    urls
}

/// Lookup table from category to strategy.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<Category, Arc<dyn CategoryStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` under its own category, replacing any previous one.
    pub fn register(mut self, strategy: Arc<dyn CategoryStrategy>) -> Self {
        self.strategies.insert(strategy.category(), strategy);
        self
    }

    pub fn get(&self, category: Category) -> Option<Arc<dyn CategoryStrategy>> {
        self.strategies.get(&category).cloned()
    }

    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<_> = self.strategies.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Registry wired to the real upstream providers, one strategy per category.
    pub fn from_config(sources: &SourcesConfig, worker: &WorkerConfig) -> SourceResult<Self> {
        let catalog: Arc<dyn SourceProvider> =
            Arc::new(TmdbCatalog::new(sources)?.with_min_unseen(worker.min_unseen));
        let search: Arc<dyn SourceProvider> = Arc::new(ImageSearch::new(sources)?);
        let store: Arc<dyn SourceProvider> = Arc::new(AppStoreSearch::new(sources)?);
        let live: Arc<dyn SourceProvider> = Arc::new(FixtureFeed::live(sources)?);
        let upcoming: Arc<dyn SourceProvider> = Arc::new(FixtureFeed::upcoming(sources)?);
        let curated: Arc<dyn SourceProvider> = Arc::new(CuratedFixtures);
        let shortlist = worker.shortlist_size;

        let mut registry = Self::new();
        for &category in Category::ALL {
            let strategy: Arc<dyn CategoryStrategy> = match category {
                Category::Movies | Category::TvShows => {
                    Arc::new(CatalogStrategy::new(category, catalog.clone(), search.clone(), shortlist))
                }
                Category::Sports => {
                    Arc::new(SportsStrategy::new(live.clone(), upcoming.clone(), curated.clone()))
                }
                Category::Recipes | Category::TvChannels => {
                    Arc::new(SearchStrategy::new(category, search.clone(), shortlist))
                }
                Category::Gaming | Category::Apps => {
                    Arc::new(StoreStrategy::new(category, store.clone(), search.clone(), shortlist))
                }
            };
            registry = registry.register(strategy);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use trend_models::SourceType;

    #[test]
    fn test_every_category_has_a_strategy() {
        let registry = StrategyRegistry::from_config(&SourcesConfig::default(), &WorkerConfig::default()).unwrap();
        assert_eq!(registry.categories().len(), Category::ALL.len());
        for &category in Category::ALL {
            assert_eq!(registry.get(category).unwrap().category(), category);
        }
    }

    #[test]
    fn test_tier_order_is_fixed() {
        let registry = StrategyRegistry::from_config(&SourcesConfig::default(), &WorkerConfig::default()).unwrap();
        let names = |category| -> Vec<&'static str> {
            registry.get(category).unwrap().tiers().iter().map(Tier::name).collect()
        };
        assert_eq!(names(Category::Movies), vec!["tmdb_catalog", "image_search"]);
        assert_eq!(
            names(Category::Sports),
            vec!["fixtures_live", "fixtures_upcoming", "fixtures_curated"]
        );
        assert_eq!(names(Category::Apps), vec!["app_store", "image_search"]);
        assert_eq!(names(Category::Recipes), vec!["image_search"]);
    }

    #[test]
    fn test_shortlist_pick_bounds() {
        let pool: Vec<_> = (0..20)
            .map(|i| Candidate::new(SourceType::Tmdb, i.to_string(), "t"))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(shortlist_pick(&pool, 5, &mut rng) < 5);
        }
        assert_eq!(shortlist_pick(&pool[..1], 5, &mut rng), 0);
    }
}
