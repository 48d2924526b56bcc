//! Trending poster pipeline.
//!
//! This crate provides:
//! - The shared dedup cache
//! - Bilingual copy generation with a Gemini backend and template fallback
//! - Per-category resolution strategies and their registry
//! - The `generate_poster` orchestrator
//! - Bundle publishing, retry, logging and metrics helpers

pub mod config;
pub mod copywriter;
pub mod dedup;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod strategies;

pub use config::{CopyConfig, WorkerConfig};
pub use copywriter::{format_count, CompletionOptions, CopyGenerator, TextBackend};
pub use dedup::{DedupCache, Selection};
pub use error::{CopyError, PipelineError, WorkerError, WorkerResult};
pub use gemini::GeminiBackend;
pub use logging::RunLogger;
pub use pipeline::PosterPipeline;
pub use publish::{publish_bundle, write_bundle, Delivery, PublishedImage};
pub use retry::{retry_async, retry_when, RetryConfig, RetryExhausted};
pub use strategies::{AssetPlan, CategoryStrategy, StrategyRegistry, Tier};
