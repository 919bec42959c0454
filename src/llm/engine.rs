//! Core `GenerationEngine` trait and the HTTP-backed `ApiEngine`.
//!
//! `ApiEngine` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! (llama.cpp server, Ollama in OpenAI mode, vLLM, LM Studio …).  All
//! connection and sampling details come from [`LlmConfig`]; nothing is
//! hardcoded.
//!
//! Both calls are blocking.  The orchestrator runs them on the blocking
//! thread pool while holding the engine gate.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::segmenter::strip_reasoning;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One `{role, content}` chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationEngine trait
// ---------------------------------------------------------------------------

/// Boxed token stream returned by [`GenerationEngine::generate_stream`].
pub type TokenStream = Box<dyn Iterator<Item = String> + Send>;

/// Blocking interface to the language model.
///
/// Implementors must be `Send + Sync` so they can be shared behind
/// `Arc<dyn GenerationEngine>`.  Sampling settings are fixed at construction.
pub trait GenerationEngine: Send + Sync {
    /// Generate the complete reply.  Reasoning blocks are stripped.
    ///
    /// With `json_mode` the backend is asked to constrain output to a JSON
    /// object.
    fn generate_blocking(&self, messages: &[ChatMessage], json_mode: bool)
        -> Result<String, LlmError>;

    /// Start a generation and return its raw token increments.
    ///
    /// Tokens may contain reasoning delimiters; feed them through a
    /// [`SentenceSegmenter`](crate::llm::SentenceSegmenter).  A transport
    /// failure mid-stream simply ends the iterator.
    fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError>;
}

// Compile-time assertion: Box<dyn GenerationEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn GenerationEngine>) {}
};

// ---------------------------------------------------------------------------
// ApiEngine
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiEngine {
    client: reqwest::blocking::Client,
    config: LlmConfig,
}

impl ApiEngine {
    /// Build an `ApiEngine` from application config.
    ///
    /// Must be called outside of an async context (the blocking client owns
    /// its own runtime).
    pub fn from_config(config: &LlmConfig) -> Self {
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
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, messages: &[ChatMessage], stream: bool, json_mode: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model":            self.config.model,
            "messages":         messages,
            "stream":           stream,
            "max_tokens":       self.config.max_tokens,
            "temperature":      self.config.temperature,
            "top_p":            self.config.top_p,
            "top_k":            self.config.top_k,
            "presence_penalty": self.config.presence_penalty,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        body
    }

    fn send(&self, body: &serde_json::Value) -> Result<reqwest::blocking::Response, LlmError> {
        let mut req = self.client.post(self.url()).json(body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        Ok(req.send()?.error_for_status()?)
    }
}

impl GenerationEngine for ApiEngine {
    fn generate_blocking(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let body = self.request_body(messages, false, json_mode);
        let response = self.send(&body)?;

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?;

        let content = strip_reasoning(content);
        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }

    fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError> {
        let body = self.request_body(messages, true, false);
        let response = self.send(&body)?;
        Ok(Box::new(SseTokens::new(response)))
    }
}

// ---------------------------------------------------------------------------
// SseTokens — server-sent-events reader
// ---------------------------------------------------------------------------

/// Iterator over `choices[0].delta.content` of a streamed chat completion.
struct SseTokens<R> {
    reader: BufReader<R>,
    done: bool,
}

impl<R: std::io::Read> SseTokens<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            done: false,
        }
    }
}

impl<R: std::io::Read> Iterator for SseTokens<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut line = String::new();
        while !self.done {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let Some(data) = line.trim().strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        self.done = true;
                        break;
                    }
                    match serde_json::from_str::<serde_json::Value>(data) {
                        Ok(chunk) => {
                            if let Some(token) = chunk["choices"][0]["delta"]["content"].as_str() {
                                return Some(token.to_string());
                            }
                        }
                        Err(e) => log::warn!("llm: skipping malformed stream chunk: {e}"),
                    }
                }
                Err(e) => {
                    log::warn!("llm: token stream interrupted: {e}");
                    self.done = true;
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
