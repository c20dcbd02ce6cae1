use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "spinwheel";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("spinwheel_config.json"))
    }

    /// `$HOME/.local/state/spinwheel`, or the platform data dir without a HOME.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn progress_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("progress.json"))
            .unwrap_or_else(|| PathBuf::from("spinwheel_progress.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("spinwheel.log"))
            .unwrap_or_else(|| PathBuf::from("spinwheel.log"))
    }
}
