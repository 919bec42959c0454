//! Configuration module for the robot voice service.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each backend,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, HistoryConfig, LlmConfig, SttConfig, TtsConfig};
