//! Content category definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Content verticals a poster can be generated for.
///
/// The set is closed: every variant needs both a resolution strategy and an
/// overlay template in the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Movies,
    TvShows,
    Sports,
    Recipes,
    Gaming,
    Apps,
    TvChannels,
}

impl Category {
    /// All supported categories.
    pub const ALL: &'static [Category] = &[
        Category::Movies,
        Category::TvShows,
        Category::Sports,
        Category::Recipes,
        Category::Gaming,
        Category::Apps,
        Category::TvChannels,
    ];

    /// Stable identifier used in storage keys, metrics labels and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movies => "movies",
            Category::TvShows => "tv_shows",
            Category::Sports => "sports",
            Category::Recipes => "recipes",
            Category::Gaming => "gaming",
            Category::Apps => "apps",
            Category::TvChannels => "tv_channels",
        }
    }

    /// Human readable label, used inside promotional copy templates.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Movies => "movie",
            Category::TvShows => "TV show",
            Category::Sports => "match",
            Category::Recipes => "recipe",
            Category::Gaming => "game",
            Category::Apps => "app",
            Category::TvChannels => "TV channel",
        }
    }

    /// Whether the background artwork is expected to be portrait shaped.
    pub fn prefers_poster_aspect(&self) -> bool {
        matches!(self, Category::Movies | Category::TvShows)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "movies" | "movie" => Ok(Category::Movies),
            "tv_shows" | "tv" | "series" => Ok(Category::TvShows),
            "sports" | "sport" => Ok(Category::Sports),
            "recipes" | "recipe" | "food" => Ok(Category::Recipes),
            "gaming" | "games" => Ok(Category::Gaming),
            "apps" | "app" => Ok(Category::Apps),
            "tv_channels" | "channels" => Ok(Category::TvChannels),
            _ => Err(CategoryParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown category: {0}")]
pub struct CategoryParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_through_str() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, *category);
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!("tv-shows".parse::<Category>().unwrap(), Category::TvShows);
        assert_eq!("Games".parse::<Category>().unwrap(), Category::Gaming);
        assert!("podcasts".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&Category::TvChannels).unwrap();
        assert_eq!(json, "\"tv_channels\"");
    }
}
