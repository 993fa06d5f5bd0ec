//! Keeps the set of live job tasks. Each job is one task that sleeps
//! until the next occurrence of its rule, runs its action, and repeats.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::rules::RecurrenceRule;

pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<String, JoinHandle<()>>,
}

impl JobRegistry {
    pub fn register(&mut self, name: String, rule: RecurrenceRule, action: JobFn) {
        if let Some(previous) = self.jobs.remove(&name) {
            warn!(job = %name, "replacing job that was already registered");
            previous.abort();
        }
        debug!(job = %name, "registering job");
        let task_name = name.clone();
        self.jobs
            .insert(name, tokio::spawn(run_job(task_name, rule, action)));
    }

    /// Aborts every job and waits for the tasks to finish so no stale
    /// action can fire during a rebuild.
    pub async fn cancel_all(&mut self) {
        for (name, handle) in self.jobs.drain() {
            debug!(job = %name, "cancelling job");
            handle.abort();
            let _ = handle.await;
        }
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.keys().map(String::as_str).collect()
    }
}

async fn run_job(name: String, rule: RecurrenceRule, action: JobFn) {
    loop {
        let now = Utc::now();
        let Some(next) = rule.next_occurrence(now) else {
            warn!(job = %name, "rule has no next occurrence, stopping job");
            return;
        };

        let wait = (next - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        debug!(job = %name, at = %next, "job sleeping until next occurrence");
        tokio::time::sleep(wait).await;

        info!(job = %name, "job triggered");
        action().await;
    }
}
