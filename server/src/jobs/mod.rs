//! Scheduled automation: recurrence rules, job planning, the task
//! registry, and the loop that keeps them in sync with the data files.

pub mod actions;
pub mod plan;
pub mod python;
pub mod rules;
pub mod runner;
pub mod scheduler;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::device::DeviceManager;
use crate::state::AlarmState;
use crate::store::Store;

/// Shared handles every job needs to do its work.
#[derive(Clone)]
pub struct JobContext {
    pub device: Arc<DeviceManager>,
    pub store: Arc<Store>,
    pub alarm_state: Arc<AlarmState>,
    pub config: AppConfig,
}
