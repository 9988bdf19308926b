//! Watch command: runs the presence watcher over a gateway event feed.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::sync::mpsc;

use aw_notify::{DiscordNotifier, Notifier, StdoutNotifier};

use crate::Config;
use crate::source::forward_events;
use crate::store::SessionStore;
use crate::watcher::{RunSummary, Watcher};

/// Events buffered between the feed reader and the watcher.
const EVENT_BUFFER: usize = 64;

/// Runs the watcher until the feed at `events` (or stdin for `-`) ends.
pub fn run(config: &Config, events: &Path) -> Result<RunSummary> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime.block_on(watch(config, events))
}

async fn watch(config: &Config, events: &Path) -> Result<RunSummary> {
    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("failed to create database directory")?;
    }
    let store = SessionStore::open(config.database_path.clone())
        .await
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let notifier = build_notifier(config)?;
    let watcher = Watcher::new(store, notifier, config.watched_user_id.clone());

    let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
    let feed = if events == Path::new("-") {
        tokio::spawn(forward_events(BufReader::new(tokio::io::stdin()), sender))
    } else {
        let file = tokio::fs::File::open(events)
            .await
            .with_context(|| format!("failed to open event feed {}", events.display()))?;
        tokio::spawn(forward_events(BufReader::new(file), sender))
    };

    let summary = watcher.run(receiver).await;
    let stats = feed.await.context("event feed task failed")??;

    tracing::info!(
        events = summary.events,
        recorded = summary.recorded,
        failed = summary.failed,
        skipped_lines = stats.skipped,
        "event feed finished"
    );
    Ok(summary)
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    match config.token() {
        Some(token) => {
            let notifier = DiscordNotifier::new(token, config.channel_id.clone())
                .context("failed to create notifier")?;
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::info!("no token configured; notifications go to stdout");
            Ok(Arc::new(StdoutNotifier))
        }
    }
}
