//! The top-level scheduling loop: gate on a sane system clock, build the
//! job set, and rebuild it whenever the data files change on disk.

use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use super::actions;
use super::plan::build_jobs;
use super::runner::{JobFn, JobRegistry};
use super::JobContext;

const CLOCK_RETRY_INTERVAL: Duration = Duration::from_secs(10);
/// The device boots with its clock at the epoch until NTP catches up.
/// Any year past this is considered synchronized.
const MIN_VALID_YEAR: i32 = 2010;

fn is_system_clock_valid() -> bool {
    Utc::now().year() > MIN_VALID_YEAR
}

/// Runs forever. `changes` carries one notification per data-dir write;
/// bursts are coalesced into a single rebuild.
pub async fn run(ctx: JobContext, mut changes: UnboundedReceiver<()>) {
    let mut attempts: u32 = 0;
    while !is_system_clock_valid() {
        attempts += 1;
        warn!(attempts, "system clock not yet synchronized, waiting");
        tokio::time::sleep(CLOCK_RETRY_INTERVAL).await;
    }
    info!("system clock is valid, starting scheduler");

    let mut registry = JobRegistry::default();
    rebuild(&ctx, &mut registry).await;

    while changes.recv().await.is_some() {
        while changes.try_recv().is_ok() {}
        info!("data files changed, rebuilding jobs");
        rebuild(&ctx, &mut registry).await;
    }
    info!("change channel closed, scheduler stopping");
}

async fn rebuild(ctx: &JobContext, registry: &mut JobRegistry) {
    registry.cancel_all().await;

    let settings = match ctx.store.load_settings().await {
        Ok(settings) => settings,
        Err(err) => {
            error!("cannot load settings, keeping no jobs: {err:#}");
            return;
        }
    };
    let schedules = match ctx.store.load_schedules().await {
        Ok(schedules) => schedules,
        Err(err) => {
            error!("cannot load schedules, keeping no jobs: {err:#}");
            return;
        }
    };

    if settings.time_zone.is_none() {
        info!("no time zone configured, nothing to schedule");
        return;
    }

    let specs = build_jobs(&settings, &schedules);
    info!(count = specs.len(), "scheduling jobs");
    for spec in specs {
        let ctx = ctx.clone();
        let action = spec.action;
        let job: JobFn = std::sync::Arc::new(move || {
            let ctx = ctx.clone();
            let action = action.clone();
            Box::pin(async move {
                actions::execute(&ctx, &action).await;
            })
        });
        registry.register(spec.name, spec.rule, job);
    }
}
