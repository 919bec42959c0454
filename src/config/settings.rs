//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! needs the keys it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the chat-completions backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible server (e.g. a local llama.cpp
    /// server at `http://localhost:8081`).
    pub base_url: String,
    /// API key — `None` for local servers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    pub presence_penalty: f32,
    /// Maximum tokens generated per reply.
    pub max_tokens: u32,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".into(),
            api_key: None,
            model: "qwen3-1.7b".into(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 20,
            presence_penalty: 1.5,
            max_tokens: 256,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the transcription backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Base URL of the OpenAI-compatible transcription server.
    pub base_url: String,
    /// Whisper model name (e.g. `"base"`).
    pub model: String,
    /// Speech language as an ISO-639-1 code.
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082".into(),
            model: "base".into(),
            language: "es".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech synthesis backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the OpenAI-compatible speech server.
    pub base_url: String,
    /// Voice identifier (e.g. a Piper voice name).
    pub voice: String,
    /// Sample rate in Hz of the PCM the voice produces.
    pub sample_rate: u32,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8083".into(),
            voice: "es_ES-davefx-medium".into(),
            sample_rate: 22_050,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Conversation history settings shared by all pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// User/assistant pairs kept per pipeline.
    pub max_turns: usize,
    /// History file — `None` means the data dir's `conversation_history.json`.
    pub file: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            file: None,
        }
    }
}

impl HistoryConfig {
    /// The history file to use, resolving the platform default.
    pub fn resolved_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| AppPaths::new().history_file)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use robot_voice::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pipelines to register (`"robot"`, `"assistant"`).  Empty means a
    /// status-only service.
    pub pipelines: Vec<String>,
    /// Chat-completions backend.
    pub llm: LlmConfig,
    /// Transcription backend.
    pub stt: SttConfig,
    /// Speech synthesis backend.
    pub tts: TtsConfig,
    /// Conversation history.
    pub history: HistoryConfig,
    /// System prompt overrides keyed by pipeline name.
    pub prompts: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipelines: vec!["robot".into(), "assistant".into()],
            llm: LlmConfig::default(),
            stt: SttConfig::default(),
            tts: TtsConfig::default(),
            history: HistoryConfig::default(),
            prompts: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured prompt override for pipeline `name`, if any.
    pub fn prompt_override(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.pipelines, loaded.pipelines);

        // LlmConfig
        assert_eq!(original.llm.base_url, loaded.llm.base_url);
        assert_eq!(original.llm.api_key, loaded.llm.api_key);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.timeout_secs, loaded.llm.timeout_secs);
        assert_eq!(original.llm.temperature, loaded.llm.temperature);
        assert_eq!(original.llm.top_k, loaded.llm.top_k);
        assert_eq!(original.llm.max_tokens, loaded.llm.max_tokens);

        // SttConfig
        assert_eq!(original.stt.model, loaded.stt.model);
        assert_eq!(original.stt.language, loaded.stt.language);

        // TtsConfig
        assert_eq!(original.tts.voice, loaded.tts.voice);
        assert_eq!(original.tts.sample_rate, loaded.tts.sample_rate);

        // HistoryConfig
        assert_eq!(original.history.max_turns, loaded.history.max_turns);
        assert_eq!(original.history.file, loaded.history.file);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.pipelines, default.pipelines);
        assert_eq!(config.llm.model, default.llm.model);
        assert_eq!(config.stt.language, default.stt.language);
        assert_eq!(config.tts.sample_rate, default.tts.sample_rate);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.pipelines, vec!["robot", "assistant"]);
        assert_eq!(cfg.llm.temperature, 0.7);
        assert_eq!(cfg.llm.top_p, 0.8);
        assert_eq!(cfg.llm.top_k, 20);
        assert_eq!(cfg.llm.presence_penalty, 1.5);
        assert_eq!(cfg.llm.max_tokens, 256);
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.stt.model, "base");
        assert_eq!(cfg.stt.language, "es");
        assert_eq!(cfg.tts.sample_rate, 22_050);
        assert_eq!(cfg.history.max_turns, 10);
        assert!(cfg.history.file.is_none());
        assert!(cfg.prompts.is_empty());
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.pipelines = vec!["robot".into()];
        cfg.llm.base_url = "https://api.openai.com".into();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.llm.model = "gpt-4o-mini".into();
        cfg.llm.timeout_secs = 30;
        cfg.stt.language = "en".into();
        cfg.tts.voice = "en_US-lessac-medium".into();
        cfg.history.file = Some(dir.path().join("h.json"));
        cfg.prompts.insert("robot".into(), "Solo JSON.".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.pipelines, vec!["robot"]);
        assert_eq!(loaded.llm.base_url, "https://api.openai.com");
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert_eq!(loaded.llm.timeout_secs, 30);
        assert_eq!(loaded.stt.language, "en");
        assert_eq!(loaded.tts.voice, "en_US-lessac-medium");
        assert_eq!(loaded.history.file, Some(dir.path().join("h.json")));
        assert_eq!(loaded.prompt_override("robot"), Some("Solo JSON."));
        assert_eq!(loaded.prompt_override("assistant"), None);
    }

    /// A partial file fills the rest from defaults.
    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "pipelines = []\n\n[llm]\nmodel = \"tiny\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert!(loaded.pipelines.is_empty());
        assert_eq!(loaded.llm.model, "tiny");
        assert_eq!(loaded.llm.max_tokens, 256);
        assert_eq!(loaded.stt.language, "es");
    }

    #[test]
    fn explicit_history_file_wins() {
        let mut cfg = HistoryConfig::default();
        assert!(cfg
            .resolved_file()
            .file_name()
            .is_some_and(|n| n == "conversation_history.json"));
        cfg.file = Some(PathBuf::from("/tmp/h.json"));
        assert_eq!(cfg.resolved_file(), PathBuf::from("/tmp/h.json"));
    }
}
