//! # Glazier Back-Office Entry Point
//!
//! Composition root: the only place that knows about every crate.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load sync configuration (file, environment, defaults)
//! 3. Connect to database & run migrations
//! 4. Build the sync service over the database's key-value table
//! 5. Attach it to the billing service and publish current listings
//! 6. Start polling; log every collection change and today's sales
//! 7. Stop on Ctrl+C / SIGTERM

use std::sync::Arc;

use chrono::Local;
use glazier_core::{DailySale, DailySummary, DataType};
use glazier_db::{Database, DbConfig, Document};
use glazier_sync::{SyncConfig, SyncService};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Glazier back office");

    let config = SyncConfig::load_or_default(None);
    let db_path = config.database_path();
    info!(?db_path, interval_ms = config.sync.poll_interval_ms, "Configuration loaded");

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!("Database connected and migrations applied");

    let sync = SyncService::new(&config, Arc::new(db.kv()));
    let billing = db.billing().with_publisher(sync.publisher());
    billing.publish_all().await;

    let _listeners: Vec<_> = config
        .tracked()
        .iter()
        .map(|&data_type| {
            sync.subscribe(
                data_type,
                Arc::new(move || info!(data_type = %data_type, "Collection changed")),
            )
        })
        .collect();

    let mut sales = sync
        .synced(DataType::DailySales, Vec::<Document<DailySale>>::new())
        .await?;
    log_today(&sales.get());

    sync.start()?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = sales.changed() => {
                if changed.is_err() {
                    break;
                }
                log_today(&sales.get());
            }
            _ = &mut shutdown => break,
        }
    }

    sync.stop();
    sales.close();
    db.close().await;

    info!("Back office shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for logging.
///
/// Log level can be controlled via RUST_LOG environment variable:
/// - `RUST_LOG=debug` - Show debug logs
/// - `RUST_LOG=glazier_sync=trace` - Trace sync operations
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,glazier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

fn log_today(sales: &[Document<DailySale>]) {
    let today = Local::now().date_naive();
    let summary = DailySummary::from_sales(
        sales.iter().map(|doc| &doc.data).filter(|sale| sale.date == today),
    );
    info!(
        total = summary.total,
        transactions = summary.transactions,
        items = summary.items,
        average = summary.average,
        "Today's sales"
    );
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
