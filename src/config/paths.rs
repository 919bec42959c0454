//! Where robot-voice keeps its files.
//!
//! `settings.toml` lives in the per-user config dir.  The conversation
//! history of every pipeline shares one JSON file in the local data dir, so
//! restarting the service resumes each dialogue where it stopped.
//!
//! ```text
//! config_dir()/robot-voice/settings.toml
//! data_local_dir()/robot-voice/conversation_history.json
//! ```

use std::path::PathBuf;

/// Resolved locations of the settings and history files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory holding the history file.
    pub data_dir: PathBuf,
    /// Shared history file of all pipelines.
    pub history_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "robot-voice";

    /// Platform directories from `dirs`, or `./robot-voice` when the
    /// platform has none.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let history_file = data_dir.join("conversation_history.json");

        Self {
            config_dir,
            settings_file,
            data_dir,
            history_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
