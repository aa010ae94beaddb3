use clap::Parser;
use pointsdb_core::config;
use pointsdb_core::store::{load_all_collections, save_collection};
use pointsdb_server::api::create_router;
use pointsdb_server::api::handlers::AppState;
use pointsdb_server::api::metrics;
use pointsdb_server::wal_async::WriteAheadLog;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "points-db", about = "In-memory point record store")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Data directory for WAL and snapshots
    #[arg(short, long, default_value = config::DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Snapshot interval in seconds (0 = disabled)
    #[arg(long, default_value_t = config::DEFAULT_SNAPSHOT_INTERVAL_SECS)]
    snapshot_interval: u64,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,

    /// Fail startup if WAL replay encounters errors (strict mode)
    #[arg(long, default_value_t = false)]
    wal_strict: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "pointsdb_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "pointsdb_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    let data_path = std::path::Path::new(&args.data_dir);
    if data_path.exists() && !data_path.is_dir() {
        eprintln!(
            "Error: data_dir '{}' exists but is not a directory",
            args.data_dir
        );
        std::process::exit(1);
    }

    // Load existing collection snapshots from disk
    let db = match load_all_collections(data_path) {
        Ok(db) => {
            for name in db.list_collections() {
                tracing::info!("Restored collection '{}'", name);
            }
            db
        }
        Err(e) => {
            tracing::warn!("Could not load collections: {}", e);
            pointsdb_core::store::Database::new()
        }
    };

    // Initialize WAL and replay pending entries
    let wal = Arc::new(WriteAheadLog::new(&args.data_dir)?);

    match wal.replay() {
        Ok((entries, stats)) => {
            let has_errors = stats.skipped > 0 || stats.crc_errors > 0 || stats.truncated > 0;
            if has_errors {
                tracing::warn!(
                    "WAL replay stats: {} ok, {} skipped, {} CRC errors, truncated={}",
                    stats.success,
                    stats.skipped,
                    stats.crc_errors,
                    stats.truncated
                );
                if args.wal_strict {
                    eprintln!(
                        "Error: WAL replay encountered errors (strict mode). \
                         {} CRC errors, {} skipped, truncated={}. \
                         Fix the WAL or restart without --wal-strict.",
                        stats.crc_errors, stats.skipped, stats.truncated
                    );
                    std::process::exit(1);
                }
            }
            if !entries.is_empty() {
                tracing::info!("Replaying {} WAL entries", entries.len());
                let applied = db.replay_wal(&entries);
                tracing::info!(
                    "WAL replay complete: {applied}/{} entries applied",
                    entries.len()
                );
            }
        }
        Err(e) => {
            if args.wal_strict {
                eprintln!(
                    "Error: WAL replay failed (strict mode): {}. \
                     Fix the WAL or restart without --wal-strict.",
                    e
                );
                std::process::exit(1);
            }
            tracing::warn!("WAL replay failed: {}", e);
        }
    }

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let wal_path = PathBuf::from(&args.data_dir).join("wal.bin");

    let state = AppState {
        db: db.clone(),
        data_dir: args.data_dir.clone(),
        wal: wal.clone(),
        wal_path: wal_path.clone(),
        prometheus_handle,
        start_time: Instant::now(),
        write_locks: Default::default(),
    };

    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let collections_count = db.collections.read().len();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        data_dir = %args.data_dir,
        snapshot_interval_secs = args.snapshot_interval,
        collections = collections_count,
        "points.db ready"
    );

    // Spawn collection metrics background task
    let metrics_db = db.clone();
    let metrics_wal_path = wal_path.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            metrics::update_collection_metrics(&metrics_db);
            metrics::update_wal_metrics(&metrics_wal_path);
        }
    });

    // Spawn auto-snapshot background task
    if args.snapshot_interval > 0 {
        let snap_db = db.clone();
        let snap_wal = wal.clone();
        let snap_data_dir = PathBuf::from(&args.data_dir);
        let snap_interval = args.snapshot_interval;
        tracing::info!("Auto-snapshots enabled every {}s", snap_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(snap_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                tracing::info!("Running periodic snapshot...");
                let _gate = snap_wal.freeze();
                let collections = snap_db.collections.read();
                let mut all_saved = true;
                for (name, collection) in collections.iter() {
                    if let Err(e) = save_collection(&snap_data_dir, collection) {
                        tracing::error!("Snapshot failed for '{}': {}", name, e);
                        all_saved = false;
                    }
                }
                drop(collections);
                if all_saved {
                    if let Err(e) = snap_wal.truncate() {
                        tracing::error!("WAL truncate after snapshot failed: {}", e);
                    } else {
                        tracing::info!("Periodic snapshot complete, WAL truncated");
                    }
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    flush_and_shutdown(&db, &wal, &args.data_dir, args.shutdown_timeout);

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}

fn flush_and_shutdown(
    db: &pointsdb_core::store::Database,
    wal: &WriteAheadLog,
    data_dir: &str,
    timeout_secs: u64,
) {
    tracing::info!("All requests drained, flushing data...");

    let _gate = wal.freeze();

    let start = Instant::now();
    let deadline = Duration::from_secs(timeout_secs);
    let data_dir = PathBuf::from(data_dir);
    let collections = db.collections.read();
    let mut all_saved = true;
    for (name, collection) in collections.iter() {
        if start.elapsed() > deadline {
            tracing::error!(
                "Shutdown flush timeout ({}s) exceeded, aborting remaining saves",
                timeout_secs
            );
            all_saved = false;
            break;
        }
        match save_collection(&data_dir, collection) {
            Ok(_) => tracing::info!("Saved collection '{}' on shutdown", name),
            Err(e) => {
                tracing::error!("Failed to save collection '{}': {}", name, e);
                all_saved = false;
            }
        }
    }

    if all_saved {
        if let Err(e) = wal.truncate() {
            tracing::error!("Failed to truncate WAL: {}", e);
        } else {
            tracing::info!("WAL truncated after successful flush");
        }
    } else {
        tracing::warn!("Some collections failed to save, WAL preserved for recovery");
    }
}
