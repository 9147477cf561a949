use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

use sitewatch::config::{Config, SiteDefinition};
use sitewatch::crawler::{decode_body, HttpFetcher, PageFetcher};
use sitewatch::monitor::MonitorWorker;
use sitewatch::notifications::dispatcher_from_config;
use sitewatch::parser::Extractor;

fn find_site<'a>(config: &'a Config, name: &str) -> Result<&'a SiteDefinition> {
    config.site(name).ok_or_else(|| {
        let known: Vec<&str> = config.sites.iter().map(|s| s.name.as_str()).collect();
        anyhow!("Unknown site '{name}' (configured: {})", known.join(", "))
    })
}

/// Print a summary of a configuration that passed validation
pub fn validate(config: &Config) {
    println!("Configuration OK");
    println!("================");
    println!("Sites: {}", config.sites.len());

    for site in &config.sites {
        println!();
        println!("  {}", site.name);
        println!("    url:      {}", site.url);
        println!("    interval: {}s", site.check_interval().as_secs());
        println!("    storage:  {}", site.storage_path().display());
        println!(
            "    fields:   {}",
            site.selectors
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!();
    match &config.notification {
        Some(n) => println!("Notifications: {}", n.service),
        None => println!("Notifications: disabled"),
    }
    if config.web.enabled {
        println!("Control API: {}", config.web.socket_address());
    } else {
        println!("Control API: disabled");
    }
}

/// Run one check against the stored snapshot and print the new items
pub async fn check(config: &Config, name: &str) -> Result<()> {
    let site = find_site(config, name)?.clone();
    let fetcher = HttpFetcher::from_config(&config.fetcher)?;
    let dispatcher = dispatcher_from_config(config.notification.as_ref())?;

    let worker = MonitorWorker::new(site, Arc::new(fetcher), dispatcher)?;
    let report = worker.run_tick().await?;

    println!(
        "{}: {} items, {} new{}",
        worker.name(),
        report.total_items,
        report.new_items.len(),
        if report.notified { ", notification sent" } else { "" }
    );
    if !report.new_items.is_empty() {
        println!("{}", serde_json::to_string_pretty(&report.new_items)?);
    }
    Ok(())
}

/// Extract items from a site, or a saved copy of its page, without
/// touching its snapshot
pub async fn extract(config: &Config, name: &str, file: Option<&Path>) -> Result<()> {
    let site = find_site(config, name)?;
    let extractor = Extractor::new(&site.selectors)?;

    let markup = match file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            decode_body(&bytes, "")
        }
        None => {
            let fetcher = HttpFetcher::from_config(&config.fetcher)?;
            fetcher.fetch(&site.url).await?
        }
    };

    let items = extractor.extract(&markup)?;
    tracing::info!(site = %site.name, items = items.len(), "Extraction complete");
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
