// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod palette;
pub mod progress;
pub mod roster;
pub mod runtime;
pub mod selector;
pub mod session;
pub mod ui;
pub mod wheel;

pub use app::{App, AppState};
pub use engine::{EngineEvent, SpinEngine};
pub use session::Mode;
