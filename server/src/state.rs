use std::sync::Arc;
use std::time::Duration;

use pod_common::Side;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Default)]
struct SideAlarm {
    vibrating: bool,
    auto_clear: Option<JoinHandle<()>>,
}

/// Ephemeral per-side "is currently vibrating" state. Kept purely in
/// memory and owned by the alarm/dismissal path: persisting it would
/// re-trigger the data-dir watcher and rebuild every job.
#[derive(Default)]
pub struct AlarmState {
    left: Mutex<SideAlarm>,
    right: Mutex<SideAlarm>,
}

impl AlarmState {
    fn slot(&self, side: Side) -> &Mutex<SideAlarm> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub async fn is_vibrating(&self, side: Side) -> bool {
        self.slot(side).lock().await.vibrating
    }

    /// Marks the side as vibrating and schedules the automatic clear after
    /// the alarm duration. A previously pending clear is replaced.
    pub async fn start_vibrating(self: &Arc<Self>, side: Side, duration: Duration) {
        let mut slot = self.slot(side).lock().await;
        if let Some(pending) = slot.auto_clear.take() {
            pending.abort();
        }
        slot.vibrating = true;

        let state = Arc::clone(self);
        slot.auto_clear = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            info!(%side, "alarm duration elapsed, clearing vibration flag");
            let mut slot = state.slot(side).lock().await;
            slot.vibrating = false;
            slot.auto_clear = None;
        }));
    }

    /// Clears the flag immediately and cancels the pending auto-clear.
    /// Used by the external dismissal path.
    pub async fn dismiss(&self, side: Side) {
        let mut slot = self.slot(side).lock().await;
        if let Some(pending) = slot.auto_clear.take() {
            pending.abort();
        }
        slot.vibrating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn auto_clear_fires_after_the_alarm_duration() {
        let state = Arc::new(AlarmState::default());
        state.start_vibrating(Side::Left, Duration::from_secs(30)).await;
        assert!(state.is_vibrating(Side::Left).await);
        assert!(!state.is_vibrating(Side::Right).await);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(!state.is_vibrating(Side::Left).await);
    }

    #[tokio::test(start_paused = true)]
    async fn dismissal_clears_immediately_and_cancels_the_timer() {
        let state = Arc::new(AlarmState::default());
        state.start_vibrating(Side::Right, Duration::from_secs(300)).await;

        state.dismiss(Side::Right).await;
        assert!(!state.is_vibrating(Side::Right).await);

        // A later re-arm must not be clobbered by the first, aborted timer.
        state.start_vibrating(Side::Right, Duration::from_secs(600)).await;
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert!(state.is_vibrating(Side::Right).await);
    }
}
