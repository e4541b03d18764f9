use clap::Parser;
use picfetch_cache::{ByteStore, CacheConfig};
use picfetch_task::{FetchScheduler, SchedulerConfig};
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod model;

use commands::{App, Commands};

#[derive(Parser)]
#[command(name = "picfetch")]
#[command(about = "Lists users, albums, and photos from a remote JSON API", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the JSON API
    #[arg(long, default_value = "https://jsonplaceholder.typicode.com")]
    base_url: String,

    /// Cache directory; defaults to the platform caches location
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(long, default_value_t = picfetch_core::DEFAULT_WORKER_POOL_SIZE)]
    workers: usize,

    /// Network timeout per fetch, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let cli = Cli::parse();

    let cache_root = match cli.cache_dir {
        Some(dir) => dir,
        None => dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("picfetch"),
    };
    tracing::debug!(cache_root = %cache_root.display(), "opening byte store");

    let store = ByteStore::new(CacheConfig::new(cache_root)).await?;
    let (scheduler, completions) = FetchScheduler::new(
        store,
        SchedulerConfig {
            pool_size: cli.workers,
            fetch_timeout: Duration::from_secs(cli.timeout_secs),
        },
    )?;

    let app = App {
        scheduler,
        completions,
        base_url: cli.base_url,
    };
    app.execute(cli.command).await
}

fn init_tracing() -> eyre::Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
