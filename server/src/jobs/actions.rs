//! Executes planned actions when their triggers fire. Failures are logged
//! and swallowed here; a missed run must never take the job loop down.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use pod_common::{encode_alarm_payload, AlarmPayload, AlarmSchedule, Side};
use tracing::{info, warn};

use super::plan::PlannedAction;
use super::python;
use super::JobContext;
use crate::device::Command;
use crate::update::{update_device_status, DeviceStatusUpdate, SideUpdate};

pub async fn execute(ctx: &JobContext, action: &PlannedAction) {
    info!(?action, "running scheduled action");
    if let Err(err) = try_execute(ctx, action).await {
        warn!(?action, "scheduled action failed: {err:#}");
    }
}

async fn try_execute(ctx: &JobContext, action: &PlannedAction) -> anyhow::Result<()> {
    match action {
        PlannedAction::PowerOn { side, temperature_f } => {
            let update = DeviceStatusUpdate::for_side(
                *side,
                SideUpdate {
                    is_on: Some(true),
                    target_temperature_f: Some(*temperature_f),
                    ..SideUpdate::default()
                },
            );
            update_device_status(&ctx.device, &ctx.store, &ctx.alarm_state, &update).await
        }
        PlannedAction::PowerOff { side } => {
            let update = DeviceStatusUpdate::for_side(
                *side,
                SideUpdate {
                    is_on: Some(false),
                    ..SideUpdate::default()
                },
            );
            update_device_status(&ctx.device, &ctx.store, &ctx.alarm_state, &update).await
        }
        PlannedAction::AdjustTemperature { side, temperature_f } => {
            let update = DeviceStatusUpdate::for_side(
                *side,
                SideUpdate {
                    target_temperature_f: Some(*temperature_f),
                    ..SideUpdate::default()
                },
            );
            update_device_status(&ctx.device, &ctx.store, &ctx.alarm_state, &update).await
        }
        PlannedAction::Alarm { side, alarm } => fire_alarm(ctx, *side, alarm).await,
        PlannedAction::Prime => {
            let update = DeviceStatusUpdate {
                is_priming: Some(true),
                ..DeviceStatusUpdate::default()
            };
            update_device_status(&ctx.device, &ctx.store, &ctx.alarm_state, &update).await
        }
        PlannedAction::AnalyzeSleep { side } => {
            // Cover the whole night plus headroom for late sleepers.
            let now = Utc::now();
            python::analyze_sleep(
                &ctx.config,
                *side,
                now - ChronoDuration::hours(12),
                now + ChronoDuration::hours(3),
            )
            .await;
            Ok(())
        }
        PlannedAction::CalibrateSensors { side } => {
            let now = Utc::now();
            python::calibrate_sensors(&ctx.config, *side, now - ChronoDuration::hours(1), now)
                .await;
            Ok(())
        }
        PlannedAction::Reboot => reboot(),
    }
}

async fn fire_alarm(ctx: &JobContext, side: Side, alarm: &AlarmSchedule) -> anyhow::Result<()> {
    // The device ignores alarms while the side is idle, and a dead side
    // means nobody is in bed to wake.
    let status = ctx.device.device_status().await?;
    if !status.side(side).is_on {
        info!(%side, "side is off, skipping alarm");
        return Ok(());
    }

    let payload = AlarmPayload {
        intensity: alarm.vibration_intensity,
        duration_seconds: alarm.duration,
        pattern: alarm.vibration_pattern,
        fired_at_epoch: Utc::now().timestamp(),
    };
    let armoured = encode_alarm_payload(&payload)?;
    ctx.device
        .execute_function(Command::alarm_for(side), &armoured)
        .await?;

    ctx.alarm_state
        .start_vibrating(side, Duration::from_secs(u64::from(alarm.duration)))
        .await;
    Ok(())
}

fn reboot() -> anyhow::Result<()> {
    info!("rebooting the device");
    tokio::spawn(async {
        if let Err(err) = tokio::process::Command::new("reboot").status().await {
            warn!("reboot command failed: {err}");
        }
    });
    Ok(())
}
