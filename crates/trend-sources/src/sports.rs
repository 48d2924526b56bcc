//! Sports fixture adapters.
//!
//! Three tiers, always tried in this order by the sports strategy:
//! 1. live fixtures (API-Football `live=all`)
//! 2. today's upcoming fixtures restricted to [`LEAGUE_ALLOW_LIST`]
//! 3. a small static curated fixture list
//!
//! Excitement scoring is the only randomized step and runs after a tier
//! has produced fixtures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use trend_models::{Candidate, CandidateMetadata, Category, Fixture, SourceType};

use crate::config::SourcesConfig;
use crate::error::{SourceError, SourceResult};
use crate::http::ProviderHttp;
use crate::provider::{ResolveContext, SourceProvider};

const PROVIDER: &str = "api_football";

/// Leagues accepted from the upcoming-fixture query:
/// Premier League, La Liga, Serie A, Bundesliga, Ligue 1, Champions League, Europa League.
pub const LEAGUE_ALLOW_LIST: &[u32] = &[39, 140, 135, 78, 61, 2, 3];

/// Clubs whose meetings are always the headline match, best first.
const TOP_TEAMS: &[&str] = &[
    "real madrid",
    "manchester city",
    "bayern munich",
    "barcelona",
    "liverpool",
    "arsenal",
    "paris saint germain",
    "inter",
    "bayer leverkusen",
    "atletico madrid",
    "juventus",
    "ac milan",
    "borussia dortmund",
    "chelsea",
    "manchester united",
    "napoli",
];

/// Range for fixtures without two top teams.
const RANDOM_EXCITEMENT: std::ops::RangeInclusive<u8> = 40..=75;

/// Statuses that count as "not started" for the upcoming tier.
const NOT_STARTED: &[&str] = &["NS", "TBD"];

#[derive(Debug, Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    response: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    fixture: FixtureInfo,
    league: LeagueInfo,
    teams: Teams,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
    date: Option<DateTime<Utc>>,
    status: Option<FixtureStatus>,
}

#[derive(Debug, Deserialize)]
struct FixtureStatus {
    short: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Teams {
    home: Team,
    away: Team,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: String,
    logo: Option<String>,
}

impl FixtureEntry {
    fn status(&self) -> Option<&str> {
        self.fixture.status.as_ref().and_then(|s| s.short.as_deref())
    }

    fn into_candidate(self, live: bool) -> Candidate {
        let fixture = Fixture {
            home: self.teams.home.name,
            away: self.teams.away.name,
            league: self.league.name,
            kickoff: self.fixture.date,
            live,
            home_logo: self.teams.home.logo,
            away_logo: self.teams.away.logo,
            excitement: 0,
        };
        fixture_candidate(SourceType::Sports, self.fixture.id.to_string(), fixture)
    }
}

fn fixture_candidate(source: SourceType, id: String, fixture: Fixture) -> Candidate {
    let title = format!("{} vs {}", fixture.home, fixture.away);
    let metadata = CandidateMetadata {
        origin: Some(fixture.league.clone()),
        genre: Some(if fixture.live { "LIVE" } else { "MATCHDAY" }.to_string()),
        fixture: Some(fixture),
        ..Default::default()
    };
    Candidate::new(source, id, title).with_metadata(metadata)
}

/// Which API-Football query a [`FixtureFeed`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureMode {
    Live,
    Upcoming,
}

/// API-Football fixture adapter.
pub struct FixtureFeed {
    http: ProviderHttp,
    api_key: Option<String>,
    base_url: String,
    mode: FixtureMode,
}

impl FixtureFeed {
    pub fn new(config: &SourcesConfig, mode: FixtureMode) -> SourceResult<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, config.request_timeout)?,
            api_key: config.sports_api_key.clone(),
            base_url: config.sports_base_url.trim_end_matches('/').to_string(),
            mode,
        })
    }

    pub fn live(config: &SourcesConfig) -> SourceResult<Self> {
        Self::new(config, FixtureMode::Live)
    }

    pub fn upcoming(config: &SourcesConfig) -> SourceResult<Self> {
        Self::new(config, FixtureMode::Upcoming)
    }
}

#[async_trait]
impl SourceProvider for FixtureFeed {
    fn name(&self) -> &'static str {
        match self.mode {
            FixtureMode::Live => "fixtures_live",
            FixtureMode::Upcoming => "fixtures_upcoming",
        }
    }

    async fn resolve(&self, category: Category, ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        if category != Category::Sports {
            return Err(SourceError::unavailable(format!(
                "fixture feed does not serve category {category}"
            )));
        }
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::unavailable("API_FOOTBALL_KEY not set"))?;

        let date = ctx.date.format("%Y-%m-%d").to_string();
        let query: Vec<(&str, &str)> = match self.mode {
            FixtureMode::Live => vec![("live", "all")],
            FixtureMode::Upcoming => vec![("date", date.as_str())],
        };

        let url = format!("{}/fixtures", self.base_url);
        let request = self
            .http
            .client()
            .get(&url)
            .header("x-apisports-key", key)
            .query(&query);
        let response: FixturesResponse = self.http.send_json(request).await?;

        let live = self.mode == FixtureMode::Live;
        Ok(response
            .response
            .into_iter()
            .filter(|entry| match self.mode {
                FixtureMode::Live => true,
                FixtureMode::Upcoming => {
                    LEAGUE_ALLOW_LIST.contains(&entry.league.id)
                        && entry.status().is_none_or(|s| NOT_STARTED.contains(&s))
                }
            })
            .map(|entry| entry.into_candidate(live))
            .collect())
    }
}

/// Static curated fixtures, the last sports tier. Never fails.
#[derive(Debug, Default, Clone)]
pub struct CuratedFixtures;

const CURATED: &[(&str, &str, &str)] = &[
    ("Real Madrid", "Barcelona", "La Liga"),
    ("Manchester City", "Liverpool", "Premier League"),
    ("Bayern Munich", "Borussia Dortmund", "Bundesliga"),
    ("Inter", "AC Milan", "Serie A"),
    ("Arsenal", "Chelsea", "Premier League"),
    ("Paris Saint Germain", "Marseille", "Ligue 1"),
];

#[async_trait]
impl SourceProvider for CuratedFixtures {
    fn name(&self) -> &'static str {
        "fixtures_curated"
    }

    async fn resolve(&self, _category: Category, _ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        Ok(CURATED
            .iter()
            .map(|(home, away, league)| {
                let id = format!("{}-{}", slug(home), slug(away));
                let fixture = Fixture {
                    home: home.to_string(),
                    away: away.to_string(),
                    league: league.to_string(),
                    kickoff: None,
                    live: false,
                    home_logo: None,
                    away_logo: None,
                    excitement: 0,
                };
                fixture_candidate(SourceType::Curated, id, fixture)
            })
            .collect())
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

fn top_team_rank(name: &str) -> Option<usize> {
    let normalized = name.to_lowercase().replace(['-', '.'], " ");
    let normalized = match normalized.trim() {
        "psg" => "paris saint germain",
        "inter milan" | "internazionale" => "inter",
        "bayern münchen" | "fc bayern" => "bayern munich",
        other => other,
    };
    TOP_TEAMS.iter().position(|t| *t == normalized)
}

/// Excitement for one fixture.
///
/// Deterministic (90-99, from the two clubs' ranks) when both teams are top
/// teams; otherwise drawn from [`RANDOM_EXCITEMENT`].
pub fn excitement<R: Rng + ?Sized>(fixture: &Fixture, rng: &mut R) -> u8 {
    match (top_team_rank(&fixture.home), top_team_rank(&fixture.away)) {
        (Some(a), Some(b)) => {
            let penalty = ((a + b) / 3).min(9) as u8;
            99 - penalty
        }
        _ => rng.random_range(RANDOM_EXCITEMENT),
    }
}

/// Assign an excitement score to every fixture in `pool`.
pub fn score_fixtures<R: Rng + ?Sized>(pool: &mut [Candidate], rng: &mut R) {
    for candidate in pool.iter_mut() {
        if let Some(fixture) = candidate.metadata.fixture.as_mut() {
            fixture.excitement = excitement(fixture, rng);
        }
    }
}

/// Index of the highest-scored fixture (first wins ties). `None` for an
/// empty pool.
pub fn most_exciting(pool: &[Candidate]) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, candidate) in pool.iter().enumerate() {
        let score = candidate.metadata.fixture.as_ref().map_or(0, |f| f.excitement);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Score every fixture in `pool` and return the index of the most exciting
/// one.
pub fn score_and_pick<R: Rng + ?Sized>(pool: &mut [Candidate], rng: &mut R) -> Option<usize> {
    score_fixtures(pool, rng);
    most_exciting(pool)
}
