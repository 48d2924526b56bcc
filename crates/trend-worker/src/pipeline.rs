//! Poster pipeline orchestrator.
//!
//! `generate_poster(category)` runs, under one overall deadline:
//! 1. resolution through the category's fallback tiers, filtered by the
//!    shared dedup cache
//! 2. asset acquisition and copy generation, concurrently
//! 3. composition and encoding on the blocking pool
//!
//! Every failure below the pipeline boundary is absorbed by a fallback;
//! only [`PipelineError::Exhausted`] reaches the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, Instrument};
use trend_media::{encode_all, AcquirePolicy, AssetFetcher, Compositor, MediaError, RasterAsset};
use trend_models::{Candidate, Category, EncodedImage, OverlaySpec, PosterBundle, POSTER_HEIGHT, POSTER_WIDTH};
use trend_sources::{KeywordSource, ResolveContext, SeedKeywords, SourcesConfig, TrendingKeywords};

use crate::config::{CopyConfig, WorkerConfig};
use crate::copywriter::{CompletionOptions, CopyGenerator};
use crate::dedup::DedupCache;
use crate::error::{PipelineError, WorkerResult};
use crate::gemini::GeminiBackend;
use crate::logging::RunLogger;
use crate::metrics;
use crate::strategies::{AssetPlan, CategoryStrategy, StrategyRegistry};

/// Trending keywords considered for the random keyword pick.
const KEYWORD_SHORTLIST: usize = 5;

/// Background and slot rasters for one run.
struct Assets {
    background: RasterAsset,
    slots: HashMap<String, RgbaImage>,
    placeholder: bool,
}

/// Sequences resolution, acquisition, copy and composition for one category.
pub struct PosterPipeline {
    registry: StrategyRegistry,
    keyword_sources: Vec<Arc<dyn KeywordSource>>,
    cache: Arc<DedupCache>,
    fetcher: AssetFetcher,
    copywriter: CopyGenerator,
    compositor: Compositor,
    config: WorkerConfig,
    seed: Option<u64>,
}

impl PosterPipeline {
    pub fn new(registry: StrategyRegistry, copywriter: CopyGenerator, config: WorkerConfig) -> WorkerResult<Self> {
        let fetcher = AssetFetcher::new(config.asset_timeout)?;
        let compositor = match &config.font_dir {
            Some(dir) => Compositor::with_font_dir(dir),
            None => Compositor::new(),
        };
        Ok(Self {
            registry,
            keyword_sources: vec![Arc::new(SeedKeywords)],
            cache: Arc::new(DedupCache::new(config.dedup_capacity)),
            fetcher,
            copywriter,
            compositor,
            config,
            seed: None,
        })
    }

    /// Pipeline wired to the real providers and text backend.
    pub fn from_config(sources: &SourcesConfig, copy: &CopyConfig, config: WorkerConfig) -> WorkerResult<Self> {
        let registry = StrategyRegistry::from_config(sources, &config)?;
        let copywriter = match GeminiBackend::from_config(copy)? {
            Some(backend) => CopyGenerator::new(Arc::new(backend), CompletionOptions::from(copy)),
            None => CopyGenerator::templates_only(),
        };
        let trending: Arc<dyn KeywordSource> = Arc::new(TrendingKeywords::new(sources)?);
        Ok(Self::new(registry, copywriter, config)?
            .with_keyword_sources(vec![trending, Arc::new(SeedKeywords)]))
    }

    /// Keyword sources, tried in order until one returns keywords.
    pub fn with_keyword_sources(mut self, sources: Vec<Arc<dyn KeywordSource>>) -> Self {
        self.keyword_sources = sources;
        self
    }

    /// Share a dedup cache with other pipelines.
    pub fn with_cache(mut self, cache: Arc<DedupCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Seed the shortlist and keyword picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn cache(&self) -> &Arc<DedupCache> {
        &self.cache
    }

    pub fn categories(&self) -> Vec<Category> {
        self.registry.categories()
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    fn policy(&self) -> AcquirePolicy {
        AcquirePolicy {
            attempt_timeout: self.config.asset_timeout,
            budget: self.config.asset_budget,
        }
    }

    /// Produce a complete poster bundle for `category`.
    pub async fn generate_poster(&self, category: Category) -> Result<PosterBundle, PipelineError> {
        let logger = RunLogger::new(category);
        let started = Instant::now();
        logger.log_start("generating poster");

        let deadline = self.config.pipeline_deadline;
        let run = self.run(category, &logger).instrument(logger.create_span());
        let result = match tokio::time::timeout(deadline, run).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::exhausted(
                category,
                format!("deadline of {}s exceeded", deadline.as_secs()),
            )),
        };

        let seconds = started.elapsed().as_secs_f64();
        match &result {
            Ok(bundle) => {
                metrics::record_run(category, "ok", seconds);
                logger.log_completion(&format!(
                    "{} in {:.1}s (placeholder: {}, degraded copy: {})",
                    bundle.candidate.key(),
                    seconds,
                    bundle.placeholder_background,
                    bundle.copy.is_degraded()
                ));
            }
            Err(e) => {
                metrics::record_run(category, "exhausted", seconds);
                logger.log_exhausted(&e.to_string());
            }
        }
        result
    }

    async fn run(&self, category: Category, logger: &RunLogger) -> Result<PosterBundle, PipelineError> {
        let strategy = self
            .registry
            .get(category)
            .ok_or_else(|| PipelineError::exhausted(category, "no strategy registered"))?;
        let mut rng = self.rng();

        let candidate = self.resolve_candidate(strategy.as_ref(), &mut rng, logger).await?;
        logger.log_progress(&format!("selected {} ({})", candidate.key(), candidate.title));

        let plan = strategy.asset_plan(&candidate);
        let (assets, copy) = tokio::join!(
            self.acquire_assets(category, &plan, logger),
            self.copywriter.generate(&candidate, category),
        );
        let assets = assets?;

        let spec = strategy.overlay(&candidate, &copy);
        let images = self.render(category, assets.background, spec, assets.slots, logger).await?;

        Ok(PosterBundle {
            category,
            candidate,
            copy,
            images,
            placeholder_background: assets.placeholder,
        })
    }

    /// Walk the tiers in order and select the first unseen candidate.
    async fn resolve_candidate(
        &self,
        strategy: &dyn CategoryStrategy,
        rng: &mut StdRng,
        logger: &RunLogger,
    ) -> Result<Candidate, PipelineError> {
        let category = strategy.category();
        let date = Utc::now().date_naive();
        let mut keyword: Option<Option<String>> = None;
        let mut failures = Vec::new();

        for tier in strategy.tiers() {
            let mut ctx = ResolveContext::new(date).with_seen(self.cache.snapshot());
            if tier.needs_keyword {
                if keyword.is_none() {
                    keyword = Some(self.trending_keyword(category, rng).await);
                }
                if let Some(Some(k)) = &keyword {
                    ctx = ctx.with_keyword(k.clone());
                }
            }

            let mut pool = match tier.provider.resolve(category, &ctx).await {
                Ok(pool) if !pool.is_empty() => pool,
                Ok(_) => {
                    metrics::record_tier_failed(category, tier.name());
                    logger.log_warning(&format!("tier {} returned no candidates", tier.name()));
                    failures.push(format!("{}: empty", tier.name()));
                    continue;
                }
                Err(e) => {
                    metrics::record_tier_failed(category, tier.name());
                    logger.log_warning(&format!("tier {} failed: {}", tier.name(), e));
                    failures.push(format!("{}: {}", tier.name(), e));
                    continue;
                }
            };

            strategy.prepare(&mut pool, rng);
            let Some(selection) = self.cache.select(&pool, |unseen| strategy.pick(unseen, rng)) else {
                continue;
            };

            if selection.cache_cleared {
                logger.log_warning(&format!("every {} candidate was seen; dedup cache cleared", tier.name()));
            }
            metrics::record_tier_used(category, tier.name());
            debug!(tier = tier.name(), pool = pool.len(), "Tier produced candidate");
            return Ok(selection.candidate);
        }

        Err(PipelineError::exhausted(
            category,
            format!("all tiers failed [{}]", failures.join("; ")),
        ))
    }

    /// First non-empty keyword source, random pick among its top entries.
    async fn trending_keyword(&self, category: Category, rng: &mut StdRng) -> Option<String> {
        for source in &self.keyword_sources {
            match source.trending_keywords(category).await {
                Ok(keywords) if !keywords.is_empty() => {
                    let top = keywords.len().min(KEYWORD_SHORTLIST);
                    let keyword = keywords[rng.random_range(0..top)].clone();
                    debug!(source = source.name(), keyword = %keyword, "Trending keyword chosen");
                    return Some(keyword);
                }
                Ok(_) => debug!(source = source.name(), "Keyword source returned nothing"),
                Err(e) => debug!(source = source.name(), "Keyword source failed: {}", e),
            }
        }
        None
    }

    async fn acquire_assets(
        &self,
        category: Category,
        plan: &AssetPlan,
        logger: &RunLogger,
    ) -> Result<Assets, PipelineError> {
        let policy = self.policy();
        let slot_fetches = plan.slots.iter().map(|(name, urls)| async move {
            (name.clone(), self.fetcher.fetch_first(urls, policy).await)
        });

        let (background, slot_results) = tokio::join!(
            self.fetcher.fetch_first(&plan.background, policy),
            join_all(slot_fetches),
        );

        let mut slots = HashMap::new();
        for (name, result) in slot_results {
            match result {
                Ok(asset) => {
                    slots.insert(name, asset.image);
                }
                Err(e) => debug!(slot = %name, "Slot artwork unavailable, using initials: {}", e),
            }
        }

        let (background, placeholder) = match background {
            Ok(asset) => (asset, false),
            Err(e) => {
                if !matches!(e, MediaError::NoVariants) {
                    logger.log_warning(&format!("background unavailable, using placeholder: {e}"));
                }
                metrics::record_placeholder(category);
                let compositor = self.compositor.clone();
                let title = plan.placeholder_title.clone();
                let asset = tokio::task::spawn_blocking(move || {
                    compositor.placeholder(category, &title, POSTER_WIDTH, POSTER_HEIGHT)
                })
                .await
                .map_err(|e| PipelineError::exhausted(category, format!("placeholder task failed: {e}")))?
                .map_err(|e| PipelineError::exhausted(category, format!("placeholder failed: {e}")))?;
                (asset, true)
            }
        };

        Ok(Assets {
            background,
            slots,
            placeholder,
        })
    }

    async fn render(
        &self,
        category: Category,
        background: RasterAsset,
        spec: OverlaySpec,
        slots: HashMap<String, RgbaImage>,
        logger: &RunLogger,
    ) -> Result<Vec<EncodedImage>, PipelineError> {
        let compositor = self.compositor.clone();
        let (images, simplified) = tokio::task::spawn_blocking(move || {
            let rendered = compositor.render_with_fallback(&background.image, &spec, &slots)?;
            let images = encode_all(&rendered.image)?;
            Ok::<_, MediaError>((images, rendered.simplified))
        })
        .await
        .map_err(|e| PipelineError::exhausted(category, format!("render task failed: {e}")))?
        .map_err(|e| PipelineError::exhausted(category, format!("composition failed: {e}")))?;

        if simplified {
            logger.log_warning("rendered with the simplified overlay");
        }
        Ok(images)
    }

    /// Today's date in UTC, used for storage keys.
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}
