//! Launches the biometrics Python scripts. The scripts run out of process
//! and report through their own logs; jobs only need fire-and-forget
//! semantics with some output breadcrumbs.

use chrono::{DateTime, Utc};
use pod_common::Side;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::AppConfig;

async fn run_script(config: &AppConfig, script: &str, args: Vec<String>) {
    if !config.python_bin.exists() {
        debug!(script, "python interpreter not present, skipping script");
        return;
    }

    let script_path = config.scripts_dir.join(script);
    info!(script = %script_path.display(), ?args, "running python script");

    let mut command = Command::new(&config.python_bin);
    command.arg("-B").arg(&script_path).args(&args);

    tokio::spawn(async move {
        match command.output().await {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if output.status.success() {
                    debug!(%stdout, "python script finished");
                } else {
                    error!(status = %output.status, %stdout, %stderr, "python script failed");
                }
            }
            Err(err) => error!("failed to launch python script: {err}"),
        }
    });
}

pub async fn analyze_sleep(
    config: &AppConfig,
    side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) {
    run_script(
        config,
        "analyze_sleep.py",
        vec![
            format!("--side={side}"),
            format!("--start_time={}", start.to_rfc3339()),
            format!("--end_time={}", end.to_rfc3339()),
        ],
    )
    .await;
}

pub async fn calibrate_sensors(
    config: &AppConfig,
    side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) {
    run_script(
        config,
        "calibrate_sensor_thresholds.py",
        vec![
            format!("--side={side}"),
            format!("--start_time={}", start.to_rfc3339()),
            format!("--end_time={}", end.to_rfc3339()),
        ],
    )
    .await;
}
