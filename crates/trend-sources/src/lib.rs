//! Trending subject source providers.
//!
//! This crate provides:
//! - The [`SourceProvider`] contract every upstream adapter implements
//! - TMDB trending/discover catalog adapter
//! - Web image search adapter (Google Custom Search)
//! - App-store listing adapter (iTunes Search)
//! - Sports fixture adapters (API-Football live/upcoming, curated list)
//! - Trending keyword source (SerpApi) with static seed fallback

pub mod app_store;
pub mod config;
pub mod error;
pub mod http;
pub mod image_search;
pub mod provider;
pub mod sports;
pub mod tmdb;
pub mod trends;

pub use app_store::AppStoreSearch;
pub use config::SourcesConfig;
pub use error::{SourceError, SourceResult};
pub use image_search::ImageSearch;
pub use provider::{KeywordSource, ResolveContext, SourceProvider};
pub use sports::{CuratedFixtures, FixtureFeed, FixtureMode};
pub use tmdb::{MediaKind, TmdbCatalog};
pub use trends::{SeedKeywords, TrendingKeywords};
