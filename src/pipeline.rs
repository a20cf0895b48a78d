use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::gtfs::{self, Bundle, BundleError};
use crate::introspect::{self, IntrospectError};
use crate::store::{Store, StoreError};
use crate::window::{self, MaterializeError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Ingestion error: {0}")]
    Bundle(#[from] BundleError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Materialization error: {0}")]
    Materialize(#[from] MaterializeError),
    #[error("Introspection error: {0}")]
    Introspect(#[from] IntrospectError),
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub store_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// (view name, row count) per materialized date.
    pub view_rows: Vec<(String, i64)>,
}

/// Run the full batch pipeline anchored at the current local time.
pub async fn run(config: &Config) -> Result<RunSummary, PipelineError> {
    run_at(config, Local::now().naive_local()).await
}

/// Run the full batch pipeline with an explicit processing timestamp.
///
/// The timestamp is captured once and threaded through: it names the store
/// file and anchors the materialization window, so a slow run still
/// produces a consistent window. Steps run strictly in sequence; the first
/// failure aborts the run, and if the store file was already created it is
/// deleted so no partial store is left queryable.
pub async fn run_at(config: &Config, started_at: NaiveDateTime) -> Result<RunSummary, PipelineError> {
    let bundle_path = config.bundle_path.clone();
    let bundle = tokio::task::spawn_blocking(move || gtfs::read_bundle(&bundle_path)).await??;

    let dates = window::window_dates(started_at.date(), config.window_days);
    let window_start = started_at.date();
    let window_end = dates.last().copied().unwrap_or(window_start);
    info!(
        start = %window_start,
        end = %window_end,
        days = config.window_days,
        "Computed materialization window"
    );

    let store = Store::create(&config.output_dir, started_at).await?;
    match load_and_materialize(&store, &bundle, &dates, config.sample_rows).await {
        Ok((snapshot_path, view_rows)) => {
            let summary = RunSummary {
                store_path: store.path().to_path_buf(),
                snapshot_path,
                window_start,
                window_end,
                view_rows,
            };
            store.close().await;
            Ok(summary)
        }
        Err(e) => {
            if let Err(cleanup) = store.destroy().await {
                warn!(error = %cleanup, "Could not remove store after aborted run");
            }
            Err(e)
        }
    }
}

async fn load_and_materialize(
    store: &Store,
    bundle: &Bundle,
    dates: &[NaiveDate],
    sample_rows: u32,
) -> Result<(PathBuf, Vec<(String, i64)>), PipelineError> {
    store.load_bundle(bundle).await?;

    let calendar = store.service_calendar().await?;
    let view_rows = window::materialize(store, &calendar, dates).await?;

    let snapshot = introspect::snapshot(store.pool(), sample_rows).await?;
    let snapshot_path = store
        .path()
        .with_file_name(format!("{}_schema.json", store.name()));
    snapshot.write_to(&snapshot_path)?;
    info!(path = %snapshot_path.display(), "Wrote schema snapshot");

    Ok((snapshot_path, view_rows))
}
