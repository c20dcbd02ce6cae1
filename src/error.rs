use thiserror::Error;

/// Reasons a spin request is turned down without touching the selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpinError {
    /// Chosen-once round has no participants left.
    #[error("no participants remain")]
    Exhausted,
}

/// Failures reading or writing the small JSON stores (config, progress).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
