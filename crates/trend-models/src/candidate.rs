//! Trending candidate records.
//!
//! Every source provider normalizes its results into [`Candidate`] values.
//! Candidates are ephemeral; they live for one resolution call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream source that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Metadata catalog (TMDB)
    Tmdb,
    /// Web image search
    ImageSearch,
    /// App-store listing
    AppStore,
    /// Sports fixture feed
    Sports,
    /// Static curated list bundled with the binary
    Curated,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Tmdb => "tmdb",
            SourceType::ImageSearch => "image_search",
            SourceType::AppStore => "app_store",
            SourceType::Sports => "sports",
            SourceType::Curated => "curated",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a candidate: `(source_type, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateKey {
    pub source: SourceType,
    pub id: String,
}

impl CandidateKey {
    pub fn new(source: SourceType, id: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.id)
    }
}

/// A sports fixture attached to a sports candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub away: String,
    pub league: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<DateTime<Utc>>,
    /// True when the fixture was in play at resolution time
    #[serde(default)]
    pub live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_logo: Option<String>,
    /// Excitement score in 0..=100
    pub excitement: u8,
}

/// Optional, source-specific facts about a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// Average rating on a 0-10 scale (app-store ratings are rescaled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    /// Origin country, language or publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installs: Option<u64>,
    /// Genre or short descriptor shown as a badge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Icon artwork (apps and games)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_ref: Option<String>,
    /// Smaller icon artwork tried after every size variant of `icon_ref`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_icon_refs: Vec<String>,
    /// Secondary artwork tried after `image_ref`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_image_refs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<Fixture>,
}

/// One possible trending subject plus its source image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub source_type: SourceType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(source_type: SourceType, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_type,
            title: title.into(),
            image_ref: None,
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn key(&self) -> CandidateKey {
        CandidateKey::new(self.source_type, self.id.clone())
    }

    /// Up to two uppercase initials of the title, used by placeholder glyphs.
    pub fn initials(&self) -> String {
        initials_of(&self.title)
    }
}

/// Up to two uppercase initials of `text`; `"?"` when no word has a letter.
pub fn initials_of(text: &str) -> String {
    let letters: Vec<char> = text
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect();

    match letters.len() {
        0 => "?".to_string(),
        1 => {
            // Single word titles use their first two letters.
            text.chars()
                .filter(|c| c.is_alphanumeric())
                .take(2)
                .flat_map(|c| c.to_uppercase())
                .collect()
        }
        _ => letters.into_iter().collect(),
    }
}
