//! Speech synthesis trait and the HTTP-backed `ApiSynthesizer`.
//!
//! Synthesizers return raw 16-bit little-endian mono PCM at
//! [`SpeechSynthesizer::sample_rate`]; WAV wrapping happens in
//! [`pcm_to_wav`](crate::tts::pcm_to_wav).

use std::time::Duration;

use thiserror::Error;

use crate::config::TtsConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors that can occur during synthesis.
#[derive(Debug, Clone, Error)]
pub enum TtsError {
    /// HTTP transport or connection error.
    #[error("speech request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("speech request timed out")]
    Timeout,
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for text-to-speech backends.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into raw PCM.  Blank text yields no audio.
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError>;

    /// Sample rate in Hz of the PCM returned by [`synthesize`](Self::synthesize).
    fn sample_rate(&self) -> u32;

    /// Voice identifier, reported by the status query.
    fn voice(&self) -> &str;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// ApiSynthesizer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/audio/speech` endpoint asking for raw PCM.
pub struct ApiSynthesizer {
    client: reqwest::blocking::Client,
    config: TtsConfig,
}

impl ApiSynthesizer {
    /// Build an `ApiSynthesizer` from application config.
    ///
    /// Must be called outside of an async context.
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/audio/speech",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl SpeechSynthesizer for ApiSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model":           self.config.voice,
            "voice":           self.config.voice,
            "input":           text,
            "response_format": "pcm",
            "sample_rate":     self.config.sample_rate,
        });

        let bytes = self
            .client
            .post(self.url())
            .json(&body)
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn voice(&self) -> &str {
        &self.config.voice
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Stub synthesizer: one 16-bit sample per character, `fail_on` text errors.
#[cfg(test)]
pub struct MockSynthesizer {
    pub calls: std::sync::Mutex<Vec<String>>,
    fail_on: Option<String>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(text: impl Into<String>) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail_on: Some(text.into()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SpeechSynthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail_on.as_deref() == Some(text) {
            return Err(TtsError::Request("mock failure".into()));
        }
        Ok(vec![0u8; text.chars().count() * 2])
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn voice(&self) -> &str {
        "mock-voice"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
