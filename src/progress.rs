use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;

/// Visit counter kept across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub visits: u64,
    pub last_visit: Option<DateTime<Utc>>,
}

impl SessionProgress {
    pub fn is_returning(&self) -> bool {
        self.visits > 1
    }

    pub fn welcome_message(&self) -> Option<String> {
        self.is_returning()
            .then(|| format!("Welcome back! This is visit #{}", self.visits))
    }
}

pub trait ProgressStore {
    fn load(&self) -> Result<SessionProgress, StoreError>;
    fn save(&self, progress: &SessionProgress) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::progress_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<SessionProgress, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(SessionProgress::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, progress: &SessionProgress) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(progress)?)?;
        Ok(())
    }
}

/// Load, bump the visit count, stamp the time and save straight away.
///
/// An unreadable record counts as a first visit; a failed save only warns.
pub fn record_visit(store: &dyn ProgressStore, now: DateTime<Utc>) -> SessionProgress {
    let mut progress = store.load().unwrap_or_else(|err| {
        warn!(error = %err, "progress record unusable, starting over");
        SessionProgress::default()
    });

    progress.visits += 1;
    progress.last_visit = Some(now);

    if let Err(err) = store.save(&progress) {
        warn!(error = %err, "could not save progress");
    }
    info!(visits = progress.visits, "visit recorded");
    progress
}
