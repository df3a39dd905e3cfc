//! # Heritage Admin
//!
//! Command-line entry point for the content console. It connects to the backend, loads
//! the first page of every table and prints what it found, streaming notifications to
//! the log as they arrive.
//!
//! ```bash
//! HERITAGE_API_TOKEN=... RUST_LOG=info cargo run -p heritage-admin -- --role reviewer
//! ```

use clap::Parser;
use heritage_admin::lifecycle::{log_notifications, AdminConsole, Args};
use heritage_admin::model::HeritageSiteId;
use resource_framework::tracing::setup_tracing;
use resource_framework::ReviewStatus;
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let args = Args::parse();
    let console = AdminConsole::connect(&args).map_err(|e| e.to_string())?;

    let listener = log_notifications(console.notifier.subscribe());

    let span = tracing::info_span!("initial_load");
    let failures = console.refresh_all().instrument(span).await;
    for (resource, err) in &failures {
        warn!(resource, error = %err, "Table failed to load");
    }

    let span = tracing::info_span!("site_artifacts");
    match console
        .artifacts
        .fetch_for_site(HeritageSiteId(1))
        .instrument(span)
        .await
    {
        Ok(items) => info!(count = items.len(), "Artifacts of site 1 loaded"),
        Err(e) => error!(error = %e, "Could not load artifacts of site 1"),
    }

    let pending = console
        .sites
        .controller()
        .snapshot()
        .items
        .iter()
        .filter(|site| site.status == ReviewStatus::Pending)
        .count();
    info!(pending, "Heritage sites awaiting review");

    // Dropping the console closes the notification channel.
    drop(console);
    match listener.await {
        Ok(logged) => info!(logged, "Notification listener stopped"),
        Err(e) => warn!(error = %e, "Notification listener ended abnormally"),
    }

    if failures.is_empty() {
        info!("Admin console session completed");
        Ok(())
    } else {
        Err(format!("{} tables failed to load", failures.len()))
    }
}
