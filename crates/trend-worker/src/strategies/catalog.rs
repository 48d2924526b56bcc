//! Movies and TV shows: metadata catalog, then image search.

use std::sync::Arc;

use rand::rngs::StdRng;
use trend_media::{expand, TMDB_POSTER_REWRITES};
use trend_models::{Candidate, Category, OverlaySpec, PromotionalCopy};
use trend_sources::SourceProvider;

use super::layout::{badge, bottom_shade, copy_blocks, cta, title, top_shade, MARGIN};
use super::{shortlist_pick, with_alternates, AssetPlan, CategoryStrategy, Tier};

pub struct CatalogStrategy {
    category: Category,
    tiers: Vec<Tier>,
    shortlist: usize,
}

impl CatalogStrategy {
    pub fn new(
        category: Category,
        catalog: Arc<dyn SourceProvider>,
        search: Arc<dyn SourceProvider>,
        shortlist: usize,
    ) -> Self {
        Self {
            category,
            tiers: vec![Tier::new(catalog), Tier::with_keyword(search)],
            shortlist,
        }
    }
}

impl CategoryStrategy for CatalogStrategy {
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
        let background = candidate
            .image_ref
            .as_deref()
            .map(|url| expand(url, TMDB_POSTER_REWRITES))
            .unwrap_or_default();
        AssetPlan {
            background: with_alternates(background, &candidate.metadata.alt_image_refs),
            slots: Vec::new(),
            placeholder_title: candidate.title.clone(),
        }
    }

    fn overlay(&self, candidate: &Candidate, copy: &PromotionalCopy) -> OverlaySpec {
        let label = match self.category {
            Category::TvShows => "Trending series",
            _ => "Trending movie",
        };
        let mut spec = OverlaySpec::new(self.category)
            .push(top_shade())
            .push(bottom_shade(900))
            .push(badge(MARGIN, 96, label, "#e11d48"));

        let meta = &candidate.metadata;
        if let Some(rating) = meta.rating.filter(|r| *r > 0.0) {
            spec = spec.push(badge(MARGIN, 180, &format!("★ {rating:.1}"), "#ca8a04"));
        }
        if let Some(genre) = &meta.genre {
            spec = spec.push(badge(600, 96, genre, "#1e293b"));
        }

        let [primary, secondary] = copy_blocks(copy, 1330);
        let call = match self.category {
            Category::TvShows => "Stream it now",
            _ => "Watch it now",
        };
        spec.push(title(&candidate.title, 1150, 20, 2))
            .push(primary)
            .push(secondary)
            .push(cta(call, "#e11d48"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_models::{CandidateMetadata, CopyOrigin, OverlayElement, SourceType};
    use trend_sources::CuratedFixtures;

    fn strategy() -> CatalogStrategy {
        CatalogStrategy::new(Category::Movies, Arc::new(CuratedFixtures), Arc::new(CuratedFixtures), 10)
    }

    fn matrix() -> Candidate {
        Candidate::new(SourceType::Tmdb, "603", "The Matrix")
            .with_image("https://image.tmdb.org/t/p/original/matrix.jpg")
            .with_metadata(CandidateMetadata {
                rating: Some(8.2),
                genre: Some("Sci-Fi".into()),
                alt_image_refs: vec!["https://image.tmdb.org/t/p/original/backdrop.jpg".into()],
                ..Default::default()
            })
    }

    #[test]
    fn test_poster_variants_then_backdrop() {
        let plan = strategy().asset_plan(&matrix());
        assert_eq!(
            plan.background,
            vec![
                "https://image.tmdb.org/t/p/original/matrix.jpg",
                "https://image.tmdb.org/t/p/w780/matrix.jpg",
                "https://image.tmdb.org/t/p/w500/matrix.jpg",
                "https://image.tmdb.org/t/p/original/backdrop.jpg",
            ]
        );
        assert!(plan.slots.is_empty());
    }

    #[test]
    fn test_overlay_has_rating_and_cta() {
        let copy = PromotionalCopy {
            text_primary: "The Matrix".into(),
            text_secondary: "The Matrix".into(),
            primary_origin: CopyOrigin::Generated,
            secondary_origin: CopyOrigin::Generated,
        };
        let spec = strategy().overlay(&matrix(), &copy);
        assert!(spec
            .elements
            .iter()
            .any(|e| matches!(e, OverlayElement::Badge(b) if b.text.contains("8.2"))));
        assert!(matches!(spec.elements.last(), Some(OverlayElement::Cta(_))));
    }
}
