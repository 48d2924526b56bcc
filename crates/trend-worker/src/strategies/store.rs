//! Gaming and apps: app-store listing, then image search.
//!
//! The background is a screenshot and the icon fills a slot. A missing icon
//! becomes an initials tile; it never fails the run.

use std::sync::Arc;

use rand::rngs::StdRng;
use trend_media::{expand, ITUNES_ICON_REWRITES, ITUNES_SCREENSHOT_REWRITES};
use trend_models::{Candidate, Category, OverlaySpec, PromotionalCopy, Rect};
use trend_sources::app_store::weighted_index;
use trend_sources::SourceProvider;

use super::layout::{badge, bottom_shade, copy_blocks, cta, image_slot, title, top_shade, MARGIN};
use super::{with_alternates, AssetPlan, CategoryStrategy, Tier};
use crate::copywriter::format_count;

pub const ICON_SLOT: &str = "icon";

const ICON_RECT: Rect = Rect::new(MARGIN, 880, 220, 220);

pub struct StoreStrategy {
    category: Category,
    tiers: Vec<Tier>,
    shortlist: usize,
}

impl StoreStrategy {
    pub fn new(
        category: Category,
        store: Arc<dyn SourceProvider>,
        search: Arc<dyn SourceProvider>,
        shortlist: usize,
    ) -> Self {
        Self {
            category,
            tiers: vec![Tier::new(store), Tier::with_keyword(search)],
            shortlist,
        }
    }
}

impl CategoryStrategy for StoreStrategy {
    fn category(&self) -> Category {
        self.category
    }

    fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    fn pick(&self, unseen: &[Candidate], rng: &mut StdRng) -> usize {
        weighted_index(unseen, self.shortlist, rng)
    }

    fn asset_plan(&self, candidate: &Candidate) -> AssetPlan {
        let background = candidate
            .image_ref
            .as_deref()
            .map(|url| expand(url, ITUNES_SCREENSHOT_REWRITES))
            .unwrap_or_default();
        let icon = candidate
            .metadata
            .icon_ref
            .as_deref()
            .map(|url| expand(url, ITUNES_ICON_REWRITES))
            .unwrap_or_default();
        let icon = with_alternates(icon, &candidate.metadata.alt_icon_refs);

        AssetPlan {
            background: with_alternates(background, &candidate.metadata.alt_image_refs),
            slots: vec![(ICON_SLOT.to_string(), icon)],
            placeholder_title: candidate.title.clone(),
        }
    }

    fn overlay(&self, candidate: &Candidate, copy: &PromotionalCopy) -> OverlaySpec {
        let (label, call, accent) = match self.category {
            Category::Gaming => ("Trending game", "Play now", "#16a34a"),
            _ => ("Trending app", "Download now", "#2563eb"),
        };
        let meta = &candidate.metadata;

        let mut spec = OverlaySpec::new(self.category)
            .push(top_shade())
            .push(bottom_shade(760))
            .push(badge(MARGIN, 96, label, accent))
            .push(image_slot(ICON_SLOT, ICON_RECT, candidate.initials(), "#334155"));

        if let Some(rating) = meta.rating.filter(|r| *r > 0.0) {
            spec = spec.push(badge(340, 920, &format!("★ {:.1}", rating / 2.0), "#ca8a04"));
        }
        if let Some(count) = meta.popularity.filter(|p| *p >= 1.0) {
            spec = spec.push(badge(340, 1000, &format!("{} ratings", format_count(count as u64)), "#1e293b"));
        }

        let [primary, secondary] = copy_blocks(copy, 1330);
        spec.push(title(&candidate.title, 1180, 22, 1))
            .push(primary)
            .push(secondary)
            .push(cta(call, accent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_models::{CandidateMetadata, CopyOrigin, OverlayElement, SourceType};
    use trend_sources::CuratedFixtures;

    fn strategy() -> StoreStrategy {
        StoreStrategy::new(Category::Gaming, Arc::new(CuratedFixtures), Arc::new(CuratedFixtures), 10)
    }

    fn minecraft() -> Candidate {
        Candidate::new(SourceType::AppStore, "479516143", "Minecraft")
            .with_image("https://is1.test/shot1/392x696bb.jpg")
            .with_metadata(CandidateMetadata {
                rating: Some(9.1),
                popularity: Some(612_000.0),
                icon_ref: Some("https://is1.test/icon/512x512bb.jpg".into()),
                alt_icon_refs: vec!["https://is1.test/icon/100x100bb.jpg".into()],
                alt_image_refs: vec!["https://is1.test/shot2/392x696bb.jpg".into()],
                ..Default::default()
            })
    }

    #[test]
    fn test_asset_plan_orders_variants() {
        let plan = strategy().asset_plan(&minecraft());
        assert_eq!(
            plan.background,
            vec![
                "https://is1.test/shot1/1242x2688bb.jpg",
                "https://is1.test/shot1/392x696bb.jpg",
                "https://is1.test/shot2/392x696bb.jpg",
            ]
        );
        let (slot, icons) = &plan.slots[0];
        assert_eq!(slot, ICON_SLOT);
        assert_eq!(
            icons,
            &vec![
                "https://is1.test/icon/1024x1024bb.png",
                "https://is1.test/icon/512x512bb.jpg",
                "https://is1.test/icon/512x512bb.png",
                "https://is1.test/icon/256x256bb.jpg",
                "https://is1.test/icon/100x100bb.jpg",
            ]
        );
    }

    #[test]
    fn test_missing_icon_has_no_variants() {
        let candidate = Candidate::new(SourceType::ImageSearch, "x", "Roblox").with_image("https://img.test/r.jpg");
        let plan = strategy().asset_plan(&candidate);
        assert!(plan.slots[0].1.is_empty());
    }

    #[test]
    fn test_overlay_shows_store_stats() {
        let copy = PromotionalCopy {
            text_primary: "Minecraft".into(),
            text_secondary: "Minecraft".into(),
            primary_origin: CopyOrigin::Template,
            secondary_origin: CopyOrigin::Template,
        };
        let spec = strategy().overlay(&minecraft(), &copy);
        let badges: Vec<_> = spec
            .elements
            .iter()
            .filter_map(|e| match e {
                OverlayElement::Badge(b) => Some(b.text.as_str()),
                _ => None,
            })
            .collect();
        assert!(badges.contains(&"612K RATINGS"));
        assert_eq!(spec.image_slots().next().unwrap().fallback_initials, "MI");
    }
}
