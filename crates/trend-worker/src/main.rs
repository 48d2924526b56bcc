//! Trending poster worker binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_models::Category;
use trend_sources::SourcesConfig;
use trend_storage::{MemoryPublisher, R2Client, StoragePublisher};
use trend_worker::{CopyConfig, Delivery, PosterPipeline, RetryConfig, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "trend-worker", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate posters for one or more categories.
    Generate(GenerateArgs),
    /// List supported categories.
    Categories,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Categories to generate (repeatable or comma separated).
    #[arg(short, long = "category", value_delimiter = ',')]
    categories: Vec<Category>,

    /// Generate every supported category.
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Upload the renditions to R2.
    #[arg(long, default_value_t = false)]
    publish: bool,

    /// With --publish, upload to an in-memory store instead of R2.
    #[arg(long, default_value_t = false, requires = "publish")]
    dry_run: bool,

    /// Write renditions and bundle metadata under this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn init_metrics() -> anyhow::Result<()> {
    let Some(port) = std::env::var("METRICS_PORT").ok().and_then(|p| p.parse::<u16>().ok()) else {
        return Ok(());
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut categories = if args.all {
        Category::ALL.to_vec()
    } else {
        args.categories
    };
    categories.sort();
    categories.dedup();
    if categories.is_empty() {
        bail!("no categories given; pass --category <name> or --all");
    }

    let out_dir = match (&args.out_dir, args.publish) {
        (Some(dir), _) => Some(dir.clone()),
        (None, false) => Some(PathBuf::from("posters")),
        (None, true) => None,
    };

    let sources = SourcesConfig::from_env();
    let copy = CopyConfig::from_env();
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let pipeline = Arc::new(PosterPipeline::from_config(&sources, &copy, config)?);
    let publisher: Option<Box<dyn StoragePublisher>> = match (args.publish, args.dry_run) {
        (false, _) => None,
        (true, true) => Some(Box::new(MemoryPublisher::new("memory://posters"))),
        (true, false) => Some(Box::new(R2Client::from_env().await.context("R2 is not configured")?)),
    };
    let retry = RetryConfig::new("poster_upload");

    // Categories share one pipeline, and with it one dedup cache.
    let results = join_all(categories.iter().map(|&category| {
        let pipeline = pipeline.clone();
        async move { (category, pipeline.generate_poster(category).await) }
    }))
    .await;

    let mut bundles = Vec::new();
    let mut exhausted = Vec::new();
    for (category, result) in results {
        match result {
            Ok(bundle) => bundles.push(bundle),
            Err(e) => {
                error!("{}", e);
                exhausted.push(category);
            }
        }
    }

    let delivery = Delivery {
        out_dir: out_dir.as_deref(),
        publisher: publisher.as_deref(),
        date: PosterPipeline::today(),
        retry: &retry,
    };
    let undelivered = delivery.deliver_all(&bundles).await;

    if !exhausted.is_empty() || !undelivered.is_empty() {
        bail!(
            "pipeline exhausted for {:?}, delivery failed for {:?}",
            exhausted,
            undelivered
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // aws-sdk and reqwest both link rustls; pick the provider explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => {
            init_metrics()?;
            info!("Starting trend-worker");
            generate(args).await
        }
        Command::Categories => {
            for category in Category::ALL {
                println!("{category}");
            }
            Ok(())
        }
    }
}
