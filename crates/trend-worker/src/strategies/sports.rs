//! Sports: live fixtures, then today's allow-listed fixtures, then the
//! curated list. The most exciting fixture wins.

use std::sync::Arc;

use rand::rngs::StdRng;
use trend_models::{initials_of, Candidate, Category, OverlaySpec, PromotionalCopy, Rect};
use trend_sources::sports::{most_exciting, score_fixtures};
use trend_sources::SourceProvider;

use super::layout::{badge, bottom_shade, copy_blocks, cta, image_slot, title, top_shade, MARGIN};
use super::{AssetPlan, CategoryStrategy, Tier};

pub const HOME_LOGO_SLOT: &str = "home_logo";
pub const AWAY_LOGO_SLOT: &str = "away_logo";

const HOME_LOGO_RECT: Rect = Rect::new(150, 560, 300, 300);
const AWAY_LOGO_RECT: Rect = Rect::new(630, 560, 300, 300);

pub struct SportsStrategy {
    tiers: Vec<Tier>,
}

impl SportsStrategy {
    pub fn new(
        live: Arc<dyn SourceProvider>,
        upcoming: Arc<dyn SourceProvider>,
        curated: Arc<dyn SourceProvider>,
    ) -> Self {
        Self {
            tiers: vec![Tier::new(live), Tier::new(upcoming), Tier::new(curated)],
        }
    }
}

impl CategoryStrategy for SportsStrategy {
    fn category(&self) -> Category {
        Category::Sports
    }

    fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    fn prepare(&self, pool: &mut [Candidate], rng: &mut StdRng) {
        score_fixtures(pool, rng);
    }

    fn pick(&self, unseen: &[Candidate], _rng: &mut StdRng) -> usize {
        most_exciting(unseen).unwrap_or(0)
    }

    /// Fixtures carry no background artwork; the placeholder gradient is used
    /// and team logos fill the two slots.
    fn asset_plan(&self, candidate: &Candidate) -> AssetPlan {
        let fixture = candidate.metadata.fixture.as_ref();
        let logo = |url: Option<&String>| url.map(|u| vec![u.clone()]).unwrap_or_default();
        AssetPlan {
            background: candidate.image_ref.iter().cloned().collect(),
            slots: vec![
                (HOME_LOGO_SLOT.to_string(), logo(fixture.and_then(|f| f.home_logo.as_ref()))),
                (AWAY_LOGO_SLOT.to_string(), logo(fixture.and_then(|f| f.away_logo.as_ref()))),
            ],
            placeholder_title: fixture
                .map(|f| f.league.clone())
                .unwrap_or_else(|| candidate.title.clone()),
        }
    }

    fn overlay(&self, candidate: &Candidate, copy: &PromotionalCopy) -> OverlaySpec {
        let fixture = candidate.metadata.fixture.as_ref();
        let (home, away) = fixture
            .map(|f| (f.home.as_str(), f.away.as_str()))
            .unwrap_or((candidate.title.as_str(), ""));
        let status = match fixture {
            Some(f) if f.live => "Live now",
            _ => "Matchday",
        };

        let mut spec = OverlaySpec::new(Category::Sports)
            .push(top_shade())
            .push(bottom_shade(900))
            .push(badge(MARGIN, 96, status, "#dc2626"));
        if let Some(f) = fixture {
            spec = spec.push(badge(MARGIN, 180, &f.league, "#1e3a8a"));
        }

        let [primary, secondary] = copy_blocks(copy, 1330);
        spec.push(image_slot(HOME_LOGO_SLOT, HOME_LOGO_RECT, initials_of(home), "#1e293b"))
            .push(image_slot(AWAY_LOGO_SLOT, AWAY_LOGO_RECT, initials_of(away), "#334155"))
            .push(title(&candidate.title, 1150, 22, 2))
            .push(primary)
            .push(secondary)
            .push(cta("Don't miss it", "#dc2626"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use trend_models::{CandidateMetadata, CopyOrigin, Fixture, OverlayElement, SourceType};
    use trend_sources::CuratedFixtures;

    fn fixture_candidate(home: &str, away: &str, logos: bool) -> Candidate {
        let fixture = Fixture {
            home: home.into(),
            away: away.into(),
            league: "La Liga".into(),
            kickoff: None,
            live: false,
            home_logo: logos.then(|| "https://logos.test/h.png".to_string()),
            away_logo: logos.then(|| "https://logos.test/a.png".to_string()),
            excitement: 0,
        };
        Candidate::new(SourceType::Sports, format!("{home}-{away}"), format!("{home} vs {away}")).with_metadata(
            CandidateMetadata {
                fixture: Some(fixture),
                ..Default::default()
            },
        )
    }

    fn strategy() -> SportsStrategy {
        SportsStrategy::new(Arc::new(CuratedFixtures), Arc::new(CuratedFixtures), Arc::new(CuratedFixtures))
    }

    #[test]
    fn test_headline_fixture_wins() {
        let mut pool = vec![
            fixture_candidate("Getafe", "Cadiz", true),
            fixture_candidate("Real Madrid", "Barcelona", true),
        ];
        let mut rng = StdRng::seed_from_u64(4);
        let strategy = strategy();
        strategy.prepare(&mut pool, &mut rng);
        assert_eq!(strategy.pick(&pool, &mut rng), 1);
    }

    #[test]
    fn test_logo_slots_and_league_placeholder() {
        let plan = strategy().asset_plan(&fixture_candidate("Arsenal", "Chelsea", true));
        assert!(plan.background.is_empty());
        assert_eq!(plan.placeholder_title, "La Liga");
        assert_eq!(plan.slots[0], (HOME_LOGO_SLOT.to_string(), vec!["https://logos.test/h.png".to_string()]));

        let plan = strategy().asset_plan(&fixture_candidate("Arsenal", "Chelsea", false));
        assert!(plan.slots.iter().all(|(_, urls)| urls.is_empty()));
    }

    #[test]
    fn test_overlay_falls_back_to_team_initials() {
        let copy = PromotionalCopy {
            text_primary: "a".into(),
            text_secondary: "b".into(),
            primary_origin: CopyOrigin::Template,
            secondary_origin: CopyOrigin::Template,
        };
        let spec = strategy().overlay(&fixture_candidate("Real Madrid", "Barcelona", false), &copy);
        let initials: Vec<_> = spec.image_slots().map(|s| s.fallback_initials.as_str()).collect();
        assert_eq!(initials, vec!["RM", "BA"]);
        assert!(spec
            .elements
            .iter()
            .any(|e| matches!(e, OverlayElement::Badge(b) if b.text == "LA LIGA")));
    }
}
