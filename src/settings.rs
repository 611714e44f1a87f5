use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

/// Presentation preferences, loaded once at startup and written back on
/// every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<Preferences>,
}

impl SettingsStore {
    pub async fn load(path: PathBuf) -> Self {
        let current = load_preferences(&path).await;
        Self {
            path,
            current: Mutex::new(current),
        }
    }

    pub async fn get(&self) -> Preferences {
        *self.current.lock().await
    }

    pub async fn save(&self, preferences: Preferences) -> Result<Preferences, StoreError> {
        let mut current = self.current.lock().await;
        let payload = serde_json::to_vec_pretty(&preferences)?;
        fs::write(&self.path, payload).await?;
        *current = preferences;
        info!("saved preferences (dark_mode: {})", preferences.dark_mode);
        Ok(preferences)
    }
}

async fn load_preferences(path: &Path) -> Preferences {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(preferences) => preferences,
            Err(err) => {
                error!("failed to parse settings file: {err}");
                Preferences::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
        Err(err) => {
            error!("failed to read settings file: {err}");
            Preferences::default()
        }
    }
}
