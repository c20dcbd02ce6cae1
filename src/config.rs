use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::session::Mode;
use crate::wheel::SpinSettings;

/// Longest spin a config or flag may ask for.
pub const MAX_SPIN_SECS: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub spin_secs: f64,
    pub min_spins: u32,
    pub max_spins: u32,
    pub mode: Mode,
    pub bell: bool,
    /// Overrides the built-in roster when set.
    pub default_names: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spin_secs: 4.0,
            min_spins: 8,
            max_spins: 12,
            mode: Mode::Points,
            bell: false,
            default_names: None,
        }
    }
}

impl Config {
    /// Spin timing with nonsensical values pulled back into range.
    pub fn spin_settings(&self) -> SpinSettings {
        let fallback = Config::default().spin_secs;
        let secs = if self.spin_secs.is_finite() && self.spin_secs > 0.0 {
            self.spin_secs.min(MAX_SPIN_SECS)
        } else {
            fallback
        };
        let duration = Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(fallback));
        let min = self.min_spins.max(1);
        let max = self.max_spins.max(min);
        SpinSettings {
            duration,
            spins: min..=max,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "ignoring malformed config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
