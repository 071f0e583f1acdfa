use anyhow::Result;
use clap::Parser;
use dsregistry::config::{ConfigLoader, ConfigRegistry, StaticDsSettings};
use dsregistry::storage::{LocalFileSystem, MemoryStore};
use dsregistry::{AggregationService, QueryServer};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Data structure registry
///
/// Serves data structure listings for flexible content templates over
/// newline-delimited JSON-RPC on stdio.
#[derive(Parser, Debug)]
#[command(name = "dsregistry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// If not specified, looks for:
    /// 1. ./.dsregistry.toml
    /// 2. $DSREGISTRY_CONFIG
    /// 3. ~/.config/dsregistry/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site root all structure paths are relative to (overrides the config file)
    #[arg(short, long)]
    site_root: Option<PathBuf>,

    /// JSON document with persisted records (overrides the config file)
    #[arg(short, long)]
    records: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, args.log_file)?;

    info!("Starting dsregistry v{}", env!("CARGO_PKG_VERSION"));

    // Configuration: explicit file first, then the default locations
    let loader = match ConfigLoader::new(args.config.as_deref()) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    let config = loader.into_config();

    // Command-line values override the config file
    let site_root = match args.site_root.or_else(|| config.site_root.clone()) {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    // Absolute so that containment checks compare like with like
    let site_root = site_root.canonicalize()?;
    info!("Site root: {}", site_root.display());

    let store = match args.records.or_else(|| config.records.clone()) {
        Some(path) => {
            info!("Loading records from {}", path.display());
            MemoryStore::load(&path)?
        }
        None => {
            info!("No records file given, serving static structures only");
            MemoryStore::new()
        }
    };

    // Entries listed in the config file seed both registry lists
    let registry = Arc::new(ConfigRegistry::new());
    config.register_into(&registry);
    info!("Registered {} configured static structure(s)", registry.len());

    // Shared behind a lock so the toggle can change while serving
    let settings: Arc<RwLock<StaticDsSettings>> = Arc::new(RwLock::new(config.static_ds.clone()));

    let service = AggregationService::new(
        registry,
        Arc::new(LocalFileSystem::new(site_root)),
        Arc::new(store),
        settings,
    )
    .with_workspace(config.workspace);

    // Blocks until stdin closes
    let server = QueryServer::new(Arc::new(service));

    info!("dsregistry ready to accept requests on stdio");

    match server.run() {
        Ok(()) => info!("Query server stopped normally"),
        Err(e) => {
            eprintln!("Query server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
