use std::path::{Path, PathBuf};

use anyhow::bail;

/// Known dac.sock locations across firmware generations. The probe picks
/// whichever the running firmware uses.
const SOCKET_PROBE_PATHS: &[&str] = &["/deviceinfo/dac.sock", "/persistent/deviceinfo/dac.sock"];

const DEFAULT_DATA_DIR: &str = "./.pod-data";
const DEFAULT_PYTHON_BIN: &str = "/home/dac/venv/bin/python";
const DEFAULT_SCRIPTS_DIR: &str = "/home/dac/biometrics/sleep_detection";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Unix domain socket path the device connects to.
    pub socket_path: PathBuf,
    /// Directory holding the settings/schedules JSON documents.
    pub data_dir: PathBuf,
    /// Python interpreter used for the analysis side-effects. Scripts are
    /// skipped entirely when this does not exist.
    pub python_bin: PathBuf,
    pub scripts_dir: PathBuf,
}

impl AppConfig {
    pub fn resolve() -> anyhow::Result<Self> {
        let socket_path = match std::env::var("POD_SOCK_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => probe_socket_path()?,
        };

        Ok(Self {
            socket_path,
            data_dir: env_path("POD_DATA_DIR", DEFAULT_DATA_DIR),
            python_bin: env_path("POD_PYTHON_BIN", DEFAULT_PYTHON_BIN),
            scripts_dir: env_path("POD_SCRIPTS_DIR", DEFAULT_SCRIPTS_DIR),
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn probe_socket_path() -> anyhow::Result<PathBuf> {
    for candidate in SOCKET_PROBE_PATHS {
        let candidate = Path::new(candidate);
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
    }
    // Fresh firmware may not have created the file yet; bind where the
    // deviceinfo directory exists.
    for candidate in SOCKET_PROBE_PATHS {
        let candidate = Path::new(candidate);
        if candidate.parent().is_some_and(Path::exists) {
            return Ok(candidate.to_path_buf());
        }
    }
    bail!("could not detect the device firmware socket path; set POD_SOCK_PATH")
}
