//! Source provider contract.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use trend_models::{Candidate, CandidateKey, Category};

use crate::error::SourceResult;

/// Inputs shared by every provider during one resolution call.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Snapshot of the dedup cache taken when resolution started
    pub seen: HashSet<CandidateKey>,
    /// Trending keyword for search-backed categories
    pub keyword: Option<String>,
    /// Calendar day the poster is generated for
    pub date: NaiveDate,
}

impl ResolveContext {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            seen: HashSet::new(),
            keyword: None,
            date,
        }
    }

    pub fn with_seen(mut self, seen: HashSet<CandidateKey>) -> Self {
        self.seen = seen;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn is_seen(&self, candidate: &Candidate) -> bool {
        self.seen.contains(&candidate.key())
    }

    /// Number of candidates in `pool` not present in the seen snapshot.
    pub fn unseen_count(&self, pool: &[Candidate]) -> usize {
        pool.iter().filter(|c| !self.is_seen(c)).count()
    }
}

/// One upstream source, normalizing its results into candidates.
///
/// Implementations must not panic or block on missing credentials; they
/// report [`crate::SourceError::Unavailable`] instead.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Provider name for logging and metrics labels.
    fn name(&self) -> &'static str;

    /// Resolve ranked candidates for `category`. Best candidates first.
    async fn resolve(&self, category: Category, ctx: &ResolveContext) -> SourceResult<Vec<Candidate>>;
}

/// Source of trending search keywords for a category.
#[async_trait]
pub trait KeywordSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Trending keywords, most popular first.
    async fn trending_keywords(&self, category: Category) -> SourceResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_models::SourceType;

    #[test]
    fn test_unseen_count() {
        let pool = vec![
            Candidate::new(SourceType::Tmdb, "1", "A"),
            Candidate::new(SourceType::Tmdb, "2", "B"),
        ];
        let seen = HashSet::from([CandidateKey::new(SourceType::Tmdb, "1")]);
        let ctx = ResolveContext::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).with_seen(seen);
        assert_eq!(ctx.unseen_count(&pool), 1);
    }
}
