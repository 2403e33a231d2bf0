//! Mawid - appointment scheduling and group coordination service
//!
//! Main entry point: configuration, tracing, database migrations, the
//! status sweep scheduler, and the HTTP server.

use std::sync::Arc;

use mawid_infra::{SweepJob, SweepScheduler, SweepSchedulerConfig};
use mawid_lib::{router, AppContext};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env before anything reads them
    match dotenvy::dotenv() {
        Ok(path) => println!("Loaded .env from: {}", path.display()),
        Err(_) => println!("No .env file found, using process environment"),
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = mawid_infra::config::load()?;
    info!(
        db_path = %config.database.path,
        host = %config.server.host,
        port = config.server.port,
        "Mawid starting"
    );

    let ctx = Arc::new(AppContext::new(config.clone())?);

    // Periodic status sweep: re-resolves persisted statuses in the
    // background. Optional; requests derive statuses on read regardless.
    let mut scheduler = if config.sweep.enabled {
        let sweep_config = SweepSchedulerConfig {
            cron_expression: config.sweep.cron_expression.clone(),
            ..Default::default()
        };
        let sweep_job: Arc<dyn SweepJob> = ctx.sweep.clone();
        let mut scheduler = SweepScheduler::with_config(sweep_config, sweep_job);
        scheduler.start().await?;
        Some(scheduler)
    } else {
        info!("Status sweep disabled by configuration");
        None
    };

    let app = router(Arc::clone(&ctx));
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = ?err, "Sweep scheduler did not stop cleanly");
        }
    }

    info!("Mawid stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install Ctrl+C handler; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
