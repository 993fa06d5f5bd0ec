use std::path::Path;

use anyhow::Context;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Watches the data directory and signals every settings/schedules change
/// so the scheduler can rebuild its job set. The returned watcher must be
/// kept alive for the callback to keep firing.
pub fn watch_data_dir(
    data_dir: &Path,
    changes: UnboundedSender<()>,
) -> anyhow::Result<RecommendedWatcher> {
    let mut watcher =
        notify::recommended_watcher(move |result: Result<Event, notify::Error>| match result {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                // The receiver being gone just means we are shutting down.
                let _ = changes.send(());
            }
            Ok(_) => {}
            Err(err) => warn!("data dir watch error: {err}"),
        })
        .context("creating data dir watcher")?;

    watcher
        .watch(data_dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", data_dir.display()))?;
    Ok(watcher)
}
