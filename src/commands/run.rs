use anyhow::{Context, Result};
use std::sync::Arc;

use sitewatch::config::Config;
use sitewatch::crawler::HttpFetcher;
use sitewatch::metrics;
use sitewatch::monitor::{MonitorManager, StatusRegistry};
use sitewatch::notifications::dispatcher_from_config;
use sitewatch::server::ApiServer;

/// Start every configured monitor and block until Ctrl+C
pub async fn run(config: Config, no_web: bool) -> Result<()> {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics unavailable");
    }

    let fetcher = HttpFetcher::from_config(&config.fetcher).context("Failed to build HTTP client")?;
    let dispatcher = dispatcher_from_config(config.notification.as_ref())
        .context("Failed to initialize notifier")?;

    let manager = Arc::new(MonitorManager::new(
        Arc::new(StatusRegistry::new()),
        Arc::new(fetcher),
        dispatcher,
    ));

    for site in &config.sites {
        let status = manager
            .add(site.clone())
            .await
            .with_context(|| format!("Failed to start monitor '{}'", site.name))?;
        println!(
            "Monitoring {} ({}) every {}s",
            status.name, status.url, status.check_interval_secs
        );
    }

    if config.web.enabled && !no_web {
        let server = ApiServer::new(config.web.clone(), Arc::clone(&manager));
        println!("Control API listening on http://{}", config.web.socket_address());
        println!("Press Ctrl+C to stop.\n");

        server.serve_with_shutdown(shutdown_signal()).await?;
    } else {
        println!("Press Ctrl+C to stop.\n");
        shutdown_signal().await;
    }

    manager.shutdown_all().await;
    println!("All monitors stopped.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
        }
        Err(e) => {
            tracing::error!("Failed to wait for Ctrl+C: {}", e);
        }
    }
}
