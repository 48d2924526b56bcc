//! End-to-end pipeline runs against fake providers and a local image host.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use trend_models::{Candidate, CandidateMetadata, Category, CopyOrigin, Rendition, SourceType};
use trend_sources::{CuratedFixtures, ResolveContext, SourceError, SourceProvider, SourceResult};
use trend_worker::strategies::{CatalogStrategy, SearchStrategy, SportsStrategy, StoreStrategy};
use trend_worker::{
    CategoryStrategy, CompletionOptions, CopyError, CopyGenerator, DedupCache, PipelineError, PosterPipeline,
    StrategyRegistry, TextBackend, WorkerConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedProvider {
    name: &'static str,
    pool: Vec<Candidate>,
}

#[async_trait]
impl SourceProvider for FixedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, _category: Category, _ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        Ok(self.pool.clone())
    }
}

struct OfflineProvider(&'static str);

#[async_trait]
impl SourceProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn resolve(&self, _category: Category, _ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        Err(SourceError::unavailable("offline"))
    }
}

struct StalledProvider;

#[async_trait]
impl SourceProvider for StalledProvider {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn resolve(&self, _category: Category, _ctx: &ResolveContext) -> SourceResult<Vec<Candidate>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

struct ScriptedBackend(String);

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn complete(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        _options: CompletionOptions,
    ) -> Result<String, CopyError> {
        Ok(self.0.clone())
    }
}

fn fixed(name: &'static str, pool: Vec<Candidate>) -> Arc<dyn SourceProvider> {
    Arc::new(FixedProvider { name, pool })
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 90, 160]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

async fn image_host(routes: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    for route in routes {
        Mock::given(method("GET"))
            .and(path(*route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(jpeg(400, 600)),
            )
            .mount(&server)
            .await;
    }
    server
}

fn config() -> WorkerConfig {
    WorkerConfig {
        dedup_capacity: 3,
        shortlist_size: 1,
        pipeline_deadline: Duration::from_secs(120),
        asset_timeout: Duration::from_secs(5),
        asset_budget: Duration::from_secs(10),
        ..WorkerConfig::default()
    }
}

fn pipeline(registry: StrategyRegistry, copywriter: CopyGenerator, config: WorkerConfig) -> PosterPipeline {
    PosterPipeline::new(registry, copywriter, config).unwrap().with_seed(7)
}

#[tokio::test]
async fn test_movie_poster_uses_generated_copy() {
    let server = image_host(&["/t/p/original/matrix.jpg"]).await;
    let matrix = Candidate::new(SourceType::Tmdb, "603", "The Matrix")
        .with_image(format!("{}/t/p/w500/matrix.jpg", server.uri()));

    let registry = StrategyRegistry::new().register(Arc::new(CatalogStrategy::new(
        Category::Movies,
        fixed("tmdb_catalog", vec![matrix]),
        Arc::new(OfflineProvider("image_search")),
        1,
    )));
    let copywriter = CopyGenerator::new(
        Arc::new(ScriptedBackend("The Matrix vuelve esta noche".into())),
        CompletionOptions {
            temperature: 0.8,
            max_length: 256,
        },
    );

    let bundle = pipeline(registry, copywriter, config())
        .generate_poster(Category::Movies)
        .await
        .unwrap();

    assert!(bundle.is_complete());
    assert!(!bundle.placeholder_background);
    assert_eq!(bundle.candidate.id, "603");
    assert!(bundle.copy.text_secondary.contains("Matrix"));
    assert_eq!(bundle.copy.secondary_origin, CopyOrigin::Generated);
    assert_eq!(bundle.image(Rendition::CanonicalPng).unwrap().width, 1080);
}

#[tokio::test]
async fn test_missing_icon_does_not_fail_gaming_poster() {
    let server = image_host(&["/shot/392x696bb.jpg"]).await;
    for variant in ["1024x1024bb.png", "512x512bb.jpg", "512x512bb.png", "256x256bb.jpg"] {
        Mock::given(method("GET"))
            .and(path(format!("/icon/{variant}")))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
    }
    let game = Candidate::new(SourceType::AppStore, "479516143", "Minecraft")
        .with_image(format!("{}/shot/392x696bb.jpg", server.uri()))
        .with_metadata(CandidateMetadata {
            rating: Some(9.0),
            icon_ref: Some(format!("{}/icon/512x512bb.jpg", server.uri())),
            ..Default::default()
        });

    let strategy = Arc::new(StoreStrategy::new(
        Category::Gaming,
        fixed("app_store", vec![game]),
        Arc::new(OfflineProvider("image_search")),
        1,
    ));
    let registry = StrategyRegistry::new().register(strategy.clone());

    let bundle = pipeline(registry, CopyGenerator::templates_only(), config())
        .generate_poster(Category::Gaming)
        .await
        .unwrap();

    assert!(bundle.is_complete());
    assert!(!bundle.placeholder_background);
    assert!(bundle.copy.is_degraded());
    assert!(bundle.copy.text_primary.contains("Minecraft"));

    let spec = strategy.overlay(&bundle.candidate, &bundle.copy);
    let slots: Vec<_> = spec.image_slots().collect();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].fallback_initials, "MI");
    server.verify().await;
}

#[tokio::test]
async fn test_sports_falls_back_to_curated_fixtures() {
    let registry = StrategyRegistry::new().register(Arc::new(SportsStrategy::new(
        Arc::new(OfflineProvider("fixtures_live")),
        fixed("fixtures_upcoming", Vec::new()),
        Arc::new(CuratedFixtures),
    )));

    let bundle = pipeline(registry, CopyGenerator::templates_only(), config())
        .generate_poster(Category::Sports)
        .await
        .unwrap();

    assert_eq!(bundle.candidate.source_type, SourceType::Curated);
    assert!(bundle.placeholder_background);
    assert!(bundle.is_complete());
}

#[tokio::test]
async fn test_consecutive_runs_do_not_repeat_until_pool_is_spent() {
    let pool = vec![
        Candidate::new(SourceType::ImageSearch, "a", "Paella"),
        Candidate::new(SourceType::ImageSearch, "b", "Tacos"),
        Candidate::new(SourceType::ImageSearch, "c", "Ramen"),
    ];
    let registry = StrategyRegistry::new().register(Arc::new(SearchStrategy::new(
        Category::Recipes,
        fixed("image_search", pool),
        3,
    )));
    let cache = Arc::new(DedupCache::new(3));
    let pipeline = PosterPipeline::new(registry, CopyGenerator::templates_only(), config())
        .unwrap()
        .with_cache(cache.clone());

    let mut titles = HashSet::new();
    for _ in 0..3 {
        let bundle = pipeline.generate_poster(Category::Recipes).await.unwrap();
        assert!(titles.insert(bundle.candidate.title));
    }
    assert_eq!(cache.len(), 3);

    // Every candidate has been seen; the cache is cleared and a run still succeeds.
    let bundle = pipeline.generate_poster(Category::Recipes).await.unwrap();
    assert!(titles.contains(&bundle.candidate.title));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_all_tiers_failing_exhausts_pipeline() {
    let registry = StrategyRegistry::new().register(Arc::new(CatalogStrategy::new(
        Category::TvShows,
        Arc::new(OfflineProvider("tmdb_catalog")),
        fixed("image_search", Vec::new()),
        1,
    )));

    let err = pipeline(registry, CopyGenerator::templates_only(), config())
        .generate_poster(Category::TvShows)
        .await
        .unwrap_err();

    assert_eq!(err.category(), Category::TvShows);
    let PipelineError::Exhausted { reason, .. } = err;
    assert!(reason.contains("tmdb_catalog"));
    assert!(reason.contains("image_search: empty"));
}

#[tokio::test]
async fn test_deadline_exhausts_pipeline() {
    let registry = StrategyRegistry::new().register(Arc::new(SearchStrategy::new(
        Category::TvChannels,
        Arc::new(StalledProvider),
        1,
    )));
    let config = WorkerConfig {
        pipeline_deadline: Duration::from_millis(200),
        ..config()
    };

    let err = pipeline(registry, CopyGenerator::templates_only(), config)
        .generate_poster(Category::TvChannels)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("deadline"));
}

#[tokio::test]
async fn test_unregistered_category_is_exhausted() {
    let err = pipeline(StrategyRegistry::new(), CopyGenerator::templates_only(), config())
        .generate_poster(Category::Apps)
        .await
        .unwrap_err();
    assert_eq!(err.category(), Category::Apps);
}
