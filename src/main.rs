use clap::{Parser, Subcommand};
use lk::config::{self, LkConfig};
use lk::guard::ServedRoot;
use lk::server::{self, AppState};
use lk::store::ThumbnailStore;
use lk::warm;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Shared flags for commands that use the thumbnail cache.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Thumbnail cache directory [default: ~/.cache/lk]
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

static VERSION: LazyLock<String> = LazyLock::new(|| {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION").to_string();
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown".to_string(),
        hash => format!("dev@{hash}"),
    }
});

fn version_string() -> &'static str {
    VERSION.as_str()
}

#[derive(Parser)]
#[command(name = "lk")]
#[command(about = "Browse a directory of photos over the LAN")]
#[command(long_about = "\
Browse a directory of photos over the LAN

Serves a directory tree as nested HTML galleries. JPEG thumbnails are
generated on first view and cached on disk, mirroring the source paths:

  /home/me/album/trip/sunset.jpg
    → ~/.cache/lk/home/me/album/trip/sunset.jpg

Settings are read from ~/.config/lk/config.toml when it exists; flags
override the file. Run 'lk gen-config' to print a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file to use instead of ~/.config/lk/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve a directory as a gallery
    Serve {
        /// Directory to serve
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Port to listen on (0 picks a free port)
        #[arg(long)]
        port: Option<u16>,
        /// Address to listen on
        #[arg(long)]
        bind: Option<IpAddr>,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// Generate every thumbnail under a directory ahead of time
    Warm {
        /// Directory to warm
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Parallel workers (capped at the number of CPU cores)
        #[arg(long)]
        jobs: Option<usize>,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lk=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            dir,
            port,
            bind,
            cache,
        } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind.to_string();
            }
            apply_cache_args(&mut config, cache);

            let bind: IpAddr = config.server.bind.parse()?;
            let store = build_store(&dir, &config)?;
            let version = version_string();
            tracing::info!(version, "starting lk");
            server::serve(AppState::new(store, version), bind, config.server.port).await?;
        }
        Command::Warm { dir, jobs, cache } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            if jobs.is_some() {
                config.processing.max_processes = jobs;
            }
            apply_cache_args(&mut config, cache);

            init_thread_pool(&config.processing);
            let store = build_store(&dir, &config)?;
            println!(
                "==> Warming {} → {}",
                store.served_root().path().display(),
                store.cache_root().display()
            );
            let stats = warm::warm(&store)?;
            println!("Cache: {stats}");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn apply_cache_args(config: &mut LkConfig, cache: CacheArgs) {
    if cache.cache_dir.is_some() {
        config.cache_dir = cache.cache_dir;
    }
}

fn build_store(dir: &Path, config: &LkConfig) -> std::io::Result<ThumbnailStore> {
    let root = ServedRoot::new(dir)?;
    let cache_root = std::path::absolute(config.cache_root())?;
    Ok(ThumbnailStore::new(
        root,
        &cache_root,
        config.thumbnails.layout,
        config.thumbnails.to_thumbnail_config(),
    ))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
