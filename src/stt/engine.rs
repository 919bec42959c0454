//! Core speech-recognition trait and implementations.
//!
//! # Overview
//!
//! [`SpeechRecognizer`] is the public interface used by the pipelines.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechRecognizer>`.
//!
//! [`ApiRecognizer`] is the production implementation; it uploads the WAV to
//! an OpenAI-compatible `/v1/audio/transcriptions` endpoint
//! (faster-whisper-server, whisper.cpp server, …).
//!
//! [`MockRecognizer`] (available under `#[cfg(test)]`) returns a
//! pre-configured response, useful for unit-testing the pipelines without a
//! transcription server.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use thiserror::Error;

use crate::config::SttConfig;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The request carried no audio bytes.
    #[error("no audio supplied")]
    EmptyAudio,

    /// HTTP transport or connection error.
    #[error("transcription request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// The server reply was not the expected `{"text": …}` JSON.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SttError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SttError::Timeout
        } else {
            SttError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text backends.
///
/// # Contract
///
/// - `wav` is a complete WAV file (any rate the backend accepts).
/// - Returns the trimmed transcript; an empty string means no speech was
///   detected.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe `wav` and return the text transcript.
    fn transcribe(&self, wav: &[u8]) -> Result<String, SttError>;
}

// Compile-time assertion: Box<dyn SpeechRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

// ---------------------------------------------------------------------------
// ApiRecognizer
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/audio/transcriptions` endpoint.
pub struct ApiRecognizer {
    client: reqwest::blocking::Client,
    config: SttConfig,
}

impl std::fmt::Debug for ApiRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRecognizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiRecognizer {
    /// Build an `ApiRecognizer` from application config.
    ///
    /// Must be called outside of an async context.
    pub fn from_config(config: &SttConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl SpeechRecognizer for ApiRecognizer {
    fn transcribe(&self, wav: &[u8]) -> Result<String, SttError> {
        if wav.is_empty() {
            return Err(SttError::EmptyAudio);
        }

        let file = Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "json");

        let json: serde_json::Value = self
            .client
            .post(self.url())
            .multipart(form)
            .send()?
            .error_for_status()?
            .json()
            .map_err(|e| SttError::Parse(e.to_string()))?;

        let text = json["text"]
            .as_str()
            .ok_or_else(|| SttError::Parse("missing \"text\" field".into()))?;
        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A stub recognizer that returns a pre-configured response.
///
/// Only compiled in test builds.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<String, SttError>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Create a mock that always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
        }
    }

    /// Create a mock that always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn transcribe(&self, wav: &[u8]) -> Result<String, SttError> {
        // Enforce the empty-audio contract even in the mock.
        if wav.is_empty() {
            return Err(SttError::EmptyAudio);
        }
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
