// src/main.rs
//
// CLI entry point: parse flags, load configuration, wire the components,
// run the selected mode.

use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use shokolink::config::{self, Config};
use shokolink::db::open_connection;
use shokolink::infrastructure::{logging, UnmatchedReport};
use shokolink::integrations::shoko::SourceCatalog;
use shokolink::integrations::tmdb::ReferenceCatalog;
use shokolink::integrations::{MetadataCache, RequestPacer, ShokoClient, TmdbClient};
use shokolink::repositories::SqliteProcessedFileRepository;
use shokolink::services::{MaterializationService, ResolutionService, SyncService};
use shokolink::{AppError, AppResult};

/// Build and maintain a media-server-compatible library tree from a Shoko
/// Server instance.
#[derive(Debug, Parser)]
#[command(name = "shokolink", version, about)]
struct Cli {
    /// Remove destination groups whose source file disappeared upstream
    #[arg(long)]
    cleanup: bool,

    /// Simulate the run without touching the filesystem or the database
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    /// Path to the configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Both of these must be reported even though the log sink may not exist
    // yet, so failures go straight to stderr.
    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logger = match logging::init_logging(&config.paths.log_dir, cli.debug) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, config) {
        Ok(()) => {
            info!("Run finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: Config) -> AppResult<()> {
    // --- Fatal setup checks, before any state is touched ---
    if !config.directories.source_root.is_dir() {
        return Err(AppError::Config(format!(
            "The 'source_root' directory does not exist or is not a directory: {}",
            config.directories.source_root.display()
        )));
    }

    debug!("--- Configuration Summary ---");
    debug!("Mode: {}", if cli.cleanup { "Cleanup" } else { "Add/Update" });
    debug!("Dry Run: {}", cli.dry_run);
    debug!("Link Type: {}", config.options.link_type.as_str());
    debug!("Source Root: {}", config.directories.source_root.display());
    debug!(
        "Destination (Shows): {}",
        config.directories.destination.display()
    );
    debug!(
        "Destination (Movies): {}",
        config.directories.movies_destination().display()
    );

    // --- Infrastructure ---
    let state = SqliteProcessedFileRepository::new(open_connection(&config.paths.db)?);
    state.initialize()?;

    let shoko: Arc<ShokoClient> = Arc::new(ShokoClient::new(&config.shoko.url, &config.shoko.api_key)?);
    let cache = MetadataCache::load(&config.paths.cache);
    let pacer = RequestPacer::new(Duration::from_millis(config.options.tmdb_request_interval_ms));
    let tmdb: Arc<TmdbClient> = Arc::new(TmdbClient::new(&config.tmdb.api_key, cache, pacer)?);

    if !shoko.check_connection() {
        return Err(AppError::Other(
            "Exiting due to failed connection check.".to_string(),
        ));
    }

    // --- Services ---
    let resolution = ResolutionService::new(
        tmdb.clone() as Arc<dyn ReferenceCatalog>,
        config.directories.destination.clone(),
        config.directories.movies_destination().to_path_buf(),
        config.options.title_similarity_threshold,
    );
    let materializer = MaterializationService::new(
        config.options.link_type,
        config.options.use_relative_symlinks,
        config.path_mappings.clone(),
        cli.dry_run,
    );

    let mut destination_roots = vec![config.directories.destination.clone()];
    if let Some(movies) = &config.directories.destination_movies {
        destination_roots.push(movies.clone());
    }

    let mut sync = SyncService::new(
        shoko.clone() as Arc<dyn SourceCatalog>,
        resolution,
        materializer,
        Box::new(state),
        config.directories.source_root.clone(),
        destination_roots,
        config.paths.unmatched_report.clone(),
        cli.dry_run,
    );

    // --- Mode execution ---
    let mode_result = if cli.cleanup {
        sync.run_cleanup()
    } else {
        let mut report = UnmatchedReport::new();
        sync.run_add_update(&mut report)
    };

    // The cache is saved on success and error paths alike.
    if let Err(e) = tmdb.persist_cache() {
        error!("Failed to save TMDb cache: {}", e);
    }

    mode_result
}
