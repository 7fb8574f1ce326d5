//! Newswire aggregator — binary entrypoint.
//! Dispatches aggregation lineages across the configured upstream sources
//! and drains them through the in-process worker pool, or provisions the
//! source allow-list from a JSON catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswire_aggregator::config::{ApiKeys, AppConfig};
use newswire_aggregator::ingest::aggregate::AggregateJob;
use newswire_aggregator::ingest::queue;
use newswire_aggregator::ingest::registry::{self, SourceKind};
use newswire_aggregator::seed;
use newswire_aggregator::store::PgStore;

#[derive(Parser, Debug)]
#[command(name = "newswire", version, about = "Aggregate news articles from configured upstream sources")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and persist articles from the configured sources
    Aggregate {
        /// Restrict the run to a single source
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
    /// Provision sources, aliases and categories from a JSON catalog
    Seed {
        /// Path to the source catalog
        #[arg(long, default_value = "config/sources.json")]
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newswire_aggregator=info,newswire=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let store = PgStore::connect(&database_url).await?;
    store.init_schema().await?;

    match cli.command {
        Command::Aggregate { source } => aggregate(&config, store, source).await,
        Command::Seed { file } => seed_sources(&store, &file).await,
    }
}

async fn aggregate(config: &AppConfig, store: PgStore, source: Option<SourceKind>) -> Result<()> {
    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing prometheus exporter")?;
        info!(%addr, "prometheus exporter listening");
    }

    let keys = ApiKeys::from_env();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("building http client")?;

    let kinds: Vec<SourceKind> = match source {
        Some(kind) => vec![kind],
        None => SourceKind::ALL.to_vec(),
    };
    let fetchers = registry::build_fetchers(&kinds, config, &keys, &client)?;

    let jobs: Vec<AggregateJob> = fetchers.into_iter().map(AggregateJob::first).collect();
    info!(lineages = jobs.len(), "dispatching aggregation lineages");

    let summary = queue::run_to_completion(Arc::new(store), jobs, &config.queue).await;

    println!(
        "aggregated {} article(s) across {} page(s) from {} lineage(s); {} skipped, {} saturated, {} failed job(s)",
        summary.stored,
        summary.pages,
        summary.lineages,
        summary.skipped,
        summary.saturated,
        summary.failed_jobs
    );
    Ok(())
}

async fn seed_sources(store: &PgStore, file: &Path) -> Result<()> {
    let catalog = seed::load_catalog(file)?;
    let report = seed::apply(store, &catalog).await?;
    println!(
        "seeded {} source(s), {} alias(es), {} categor(ies)",
        report.sources, report.aliases, report.categories
    );
    Ok(())
}
