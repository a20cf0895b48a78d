use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gtfs_schedule_store::config::Config;
use gtfs_schedule_store::pipeline::{self, PipelineError};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Ingestion run failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PipelineError> {
    let config = Config::load("config.yaml")?;
    config.validate()?;
    tracing::info!(
        bundle = %config.bundle_path.display(),
        window_days = config.window_days,
        "Loaded configuration"
    );

    let summary = pipeline::run(&config).await?;
    let total_rows: i64 = summary.view_rows.iter().map(|(_, rows)| *rows).sum();
    tracing::info!(
        store = %summary.store_path.display(),
        snapshot = %summary.snapshot_path.display(),
        window_start = %summary.window_start,
        window_end = %summary.window_end,
        views = summary.view_rows.len(),
        total_rows,
        "Ingestion run complete"
    );
    Ok(())
}
