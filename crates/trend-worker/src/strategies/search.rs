//! Recipes and TV channels: image search for the day's trending keyword.

use std::sync::Arc;

use rand::rngs::StdRng;
use trend_models::{Candidate, Category, OverlaySpec, PromotionalCopy};
use trend_sources::SourceProvider;

use super::layout::{badge, bottom_shade, copy_blocks, cta, title, top_shade, MARGIN};
use super::{shortlist_pick, with_alternates, AssetPlan, CategoryStrategy, Tier};

pub struct SearchStrategy {
    category: Category,
    tiers: Vec<Tier>,
    shortlist: usize,
}

impl SearchStrategy {
    pub fn new(category: Category, search: Arc<dyn SourceProvider>, shortlist: usize) -> Self {
        Self {
            category,
            tiers: vec![Tier::with_keyword(search)],
            shortlist,
        }
    }

    fn labels(&self) -> (&'static str, &'static str, &'static str) {
        match self.category {
            Category::Recipes => ("Trending recipe", "Cook it tonight", "#ea580c"),
            _ => ("Trending on TV", "Tune in now", "#7c3aed"),
        }
    }
}

impl CategoryStrategy for SearchStrategy {
    fn category(&self) -> Category {
        self.category
    }

    fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    fn pick(&self, unseen: &[Candidate], rng: &mut StdRng) -> usize {
        shortlist_pick(unseen, self.shortlist, rng)
    }

    fn asset_plan(&self, candidate: &Candidate) -> AssetPlan {
        AssetPlan {
            background: with_alternates(
                candidate.image_ref.iter().cloned().collect(),
                &candidate.metadata.alt_image_refs,
            ),
            slots: Vec::new(),
            placeholder_title: candidate.title.clone(),
        }
    }

    fn overlay(&self, candidate: &Candidate, copy: &PromotionalCopy) -> OverlaySpec {
        let (label, call, accent) = self.labels();
        let [primary, secondary] = copy_blocks(copy, 1330);
        OverlaySpec::new(self.category)
            .push(top_shade())
            .push(bottom_shade(880))
            .push(badge(MARGIN, 96, label, accent))
            .push(title(&candidate.title, 1150, 20, 2))
            .push(primary)
            .push(secondary)
            .push(cta(call, accent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_models::SourceType;
    use trend_sources::CuratedFixtures;

    #[test]
    fn test_single_keyword_tier() {
        let strategy = SearchStrategy::new(Category::Recipes, Arc::new(CuratedFixtures), 10);
        assert_eq!(strategy.tiers().len(), 1);
        assert!(strategy.tiers()[0].needs_keyword);
    }

    #[test]
    fn test_background_is_search_result() {
        let strategy = SearchStrategy::new(Category::TvChannels, Arc::new(CuratedFixtures), 10);
        let candidate = Candidate::new(SourceType::ImageSearch, "ab12", "ESPN").with_image("https://img.test/espn.jpg");
        let plan = strategy.asset_plan(&candidate);
        assert_eq!(plan.background, vec!["https://img.test/espn.jpg"]);
        assert_eq!(plan.placeholder_title, "ESPN");
    }
}
