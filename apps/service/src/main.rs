mod config;
mod models;
mod monitoring;
mod notify;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use config::Config;
use monitoring::{DedupTracker, HttpProber, Scheduler, StateEvaluator};
use notify::{LogNotifier, Notifier, webhook::WebhookNotifier};
use store::memory::{MemoryEventStore, MemoryRegistry};

#[derive(Debug, Parser)]
#[command(name = "sitewatch-service", about = "HTTP monitor health-check daemon")]
struct Args {
    /// Path to the config file (defaults to the XDG config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let config = Config::from_config(args.config.as_ref())?;
    if args.show_config {
        println!("{config}");
        return Ok(());
    }

    let settings = config.scheduler.settings();
    let notifier: Arc<dyn Notifier> = match &config.notify.endpoint {
        Some(endpoint) => Arc::new(WebhookNotifier::new(endpoint.clone())?),
        None => Arc::new(LogNotifier),
    };

    let monitors = config.seed_monitors();
    info!("Retrieved {} monitors from the configuration.", monitors.len());

    let registry = Arc::new(MemoryRegistry::new(monitors));
    let events = Arc::new(MemoryEventStore::new());
    let dedup = DedupTracker::new();
    let evaluator = Arc::new(StateEvaluator::new(
        registry.clone(),
        events,
        notifier,
        dedup.clone(),
    ));
    let prober = Arc::new(HttpProber::new()?);

    let scheduler =
        Arc::new(Scheduler::new(registry, prober, evaluator, dedup, settings));
    Arc::clone(&scheduler).start().await?;
    info!("sitewatch service started.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    scheduler.shutdown().await;

    Ok(())
}
