//! The shared live-update path. Scheduled jobs and external callers alike
//! funnel device mutations through here; planning is pure (a command list)
//! and execution runs the list through the sequential device queue.

use std::collections::BTreeMap;

use ciborium::value::Value;
use pod_common::{encode_device_settings, level_from_f, Settings, Side};
use tracing::{debug, info};

use crate::device::{Command, DeviceManager, EMPTY_ARG};
use crate::state::AlarmState;
use crate::store::Store;

/// Heating duration (seconds) used when a side is simply switched on.
const ON_DURATION_SECONDS: &str = "43200";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideUpdate {
    pub is_on: Option<bool>,
    pub target_temperature_f: Option<i32>,
    pub seconds_remaining: Option<u32>,
    pub is_alarm_vibrating: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatusUpdate {
    pub left: Option<SideUpdate>,
    pub right: Option<SideUpdate>,
    pub is_priming: Option<bool>,
    pub settings: Option<BTreeMap<String, Value>>,
}

impl DeviceStatusUpdate {
    pub fn for_side(side: Side, update: SideUpdate) -> Self {
        match side {
            Side::Left => Self {
                left: Some(update),
                ..Self::default()
            },
            Side::Right => Self {
                right: Some(update),
                ..Self::default()
            },
        }
    }
}

/// Derives the concrete command sequence for an update. Pure, so the
/// away-mode fan-out and level math stay easy to test.
pub fn plan_update(
    settings: &Settings,
    update: &DeviceStatusUpdate,
) -> anyhow::Result<Vec<(Command, String)>> {
    let mut commands = Vec::new();

    if update.is_priming == Some(true) {
        commands.push((Command::Prime, EMPTY_ARG.to_string()));
    }
    if let Some(side_update) = &update.left {
        plan_side(settings, Side::Left, side_update, &mut commands);
    }
    if let Some(side_update) = &update.right {
        plan_side(settings, Side::Right, side_update, &mut commands);
    }
    if let Some(device_settings) = &update.settings {
        commands.push((Command::SetSettings, encode_device_settings(device_settings)?));
    }

    Ok(commands)
}

fn plan_side(
    settings: &Settings,
    side: Side,
    update: &SideUpdate,
    commands: &mut Vec<(Command, String)>,
) {
    // The pod cannot drive one zone independently while the other is
    // unattended, so an away flag on either side targets both.
    let targets: &[Side] = if settings.either_side_away() {
        debug!("one side is in away mode, updating both sides");
        &Side::BOTH
    } else {
        std::slice::from_ref(&side)
    };

    if let Some(is_on) = update.is_on {
        let duration = if is_on { ON_DURATION_SECONDS } else { "0" };
        for target in targets {
            commands.push((Command::temp_duration_for(*target), duration.to_string()));
        }
    }

    if let Some(temperature_f) = update.target_temperature_f {
        let level = level_from_f(temperature_f).to_string();
        for target in targets {
            commands.push((Command::temp_level_for(*target), level.clone()));
        }
    }

    if let Some(seconds) = update.seconds_remaining {
        for target in targets {
            commands.push((Command::temp_duration_for(*target), seconds.to_string()));
        }
    }

    if update.is_alarm_vibrating == Some(false) {
        commands.push((Command::AlarmClear, EMPTY_ARG.to_string()));
    }
}

/// Applies an update to the device. Settings are re-read so away-mode
/// always reflects the current store, not the snapshot a job was built
/// from.
pub async fn update_device_status(
    device: &DeviceManager,
    store: &Store,
    alarm_state: &AlarmState,
    update: &DeviceStatusUpdate,
) -> anyhow::Result<()> {
    info!("updating device status");
    let settings = store.load_settings().await?;
    let commands = plan_update(&settings, update)?;

    for (command, arg) in &commands {
        device.execute_function(*command, arg).await?;
    }

    // Dismissal also clears the in-memory flag, independently of the
    // auto-clear timer.
    for (side, side_update) in [(Side::Left, &update.left), (Side::Right, &update.right)] {
        if let Some(side_update) = side_update {
            if side_update.is_alarm_vibrating == Some(false) {
                alarm_state.dismiss(side).await;
            }
        }
    }

    info!("finished updating device status");
    Ok(())
}
