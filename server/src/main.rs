mod config;
mod device;
mod jobs;
mod state;
mod store;
mod update;
mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::device::DeviceManager;
use crate::jobs::JobContext;
use crate::state::AlarmState;
use crate::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::resolve()?;
    info!(socket = %config.socket_path.display(), data = %config.data_dir.display(), "starting pod server");

    let store = Arc::new(Store::new(&config.data_dir));
    store.ensure_defaults().await?;

    let device = Arc::new(DeviceManager::start(&config.socket_path).await?);
    let alarm_state = Arc::new(AlarmState::default());

    let (changes_tx, changes_rx) = mpsc::unbounded_channel();
    // Dropping the watcher stops the notifications, so it lives here.
    let _watcher = watch::watch_data_dir(&config.data_dir, changes_tx)?;

    let ctx = JobContext {
        device,
        store,
        alarm_state,
        config,
    };
    tokio::spawn(jobs::scheduler::run(ctx, changes_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
