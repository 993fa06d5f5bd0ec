use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use pod_common::{Schedules, Settings};
use tokio::sync::Mutex;

/// File-backed document store for the user settings and the weekly
/// schedules. Documents are read and written whole; external edits are
/// picked up through the data-dir watcher, not through this type.
pub struct Store {
    settings_path: PathBuf,
    schedules_path: PathBuf,
    lock: Mutex<()>,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
            schedules_path: data_dir.join("schedules.json"),
            lock: Mutex::new(()),
        }
    }

    pub async fn load_settings(&self) -> anyhow::Result<Settings> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(&self.settings_path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("parsing {}", self.settings_path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        write_document(&self.settings_path, settings).await
    }

    pub async fn load_schedules(&self) -> anyhow::Result<Schedules> {
        let _guard = self.lock.lock().await;
        let mut schedules: Schedules = match tokio::fs::read(&self.schedules_path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("parsing {}", self.schedules_path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Schedules::default(),
            Err(err) => return Err(err.into()),
        };
        schedules.sanitize();
        Ok(schedules)
    }

    pub async fn save_schedules(&self, schedules: &Schedules) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        write_document(&self.schedules_path, schedules).await
    }

    /// Writes default documents for anything missing so first-run users
    /// have files to edit and the watcher has something to watch.
    pub async fn ensure_defaults(&self) -> anyhow::Result<()> {
        let settings = self.load_settings().await?;
        self.save_settings(&settings).await?;
        let schedules = self.load_schedules().await?;
        self.save_schedules(&schedules).await?;
        Ok(())
    }
}

async fn write_document<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, payload)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pod-store-test-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn missing_documents_load_as_defaults() {
        let store = Store::new(&scratch_dir("defaults"));
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
        assert_eq!(store.load_schedules().await.unwrap(), Schedules::default());
    }

    #[tokio::test]
    async fn documents_round_trip_through_disk() {
        let dir = scratch_dir("roundtrip");
        let store = Store::new(&dir);

        let mut settings = Settings::default();
        settings.time_zone = Some("America/New_York".to_string());
        settings.left.away_mode = true;
        store.save_settings(&settings).await.unwrap();

        assert_eq!(store.load_settings().await.unwrap(), settings);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
