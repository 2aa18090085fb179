use std::env;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};

use hrtrack::{config::AppConfig, db, workers::retention};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("sweep-history") => sweep_history().await?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\nUsage: maintenance sweep-history");
            std::process::exit(1);
        }
        None => {
            eprintln!("Usage: maintenance sweep-history");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Direct sweep for cron or operator use; the worker normally runs the same
/// pass through the job queue.
async fn sweep_history() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        retention_days = config.history_retention_days,
        "loaded backend configuration"
    );
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let cutoff = (Utc::now() - ChronoDuration::days(config.history_retention_days)).naive_utc();
    let deleted = retention::sweep_history(&mut conn, cutoff)
        .context("failed to sweep location history")?;

    println!("Deleted {deleted} location history records older than {cutoff}.");
    Ok(())
}
