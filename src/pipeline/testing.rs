//! Test doubles shared by the pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::{ChatMessage, GenerationEngine, LlmError, TokenStream};

/// Generation engine that replays a fixed reply or token script.
pub struct ScriptedLlm {
    reply: String,
    tokens: Vec<String>,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    json_mode: Mutex<Option<bool>>,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl ScriptedLlm {
    /// Blocking generation returns `reply`.
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            tokens: Vec::new(),
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            json_mode: Mutex::new(None),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Streaming generation yields `tokens`; blocking returns their join.
    pub fn tokens(tokens: &[&str]) -> Self {
        let mut llm = Self::reply(tokens.concat());
        llm.tokens = tokens.iter().map(|t| t.to_string()).collect();
        llm
    }

    /// Every call fails with a timeout.
    pub fn failing() -> Self {
        let mut llm = Self::reply("");
        llm.fail = true;
        llm
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_json_mode(&self) -> Option<bool> {
        *self.json_mode.lock().unwrap()
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }

    fn record(&self, messages: &[ChatMessage], json_mode: bool) -> Result<(), LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.json_mode.lock().unwrap() = Some(json_mode);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            Err(LlmError::Timeout)
        } else {
            Ok(())
        }
    }
}

impl GenerationEngine for ScriptedLlm {
    fn generate_blocking(&self, messages: &[ChatMessage], json_mode: bool) -> Result<String, LlmError> {
        self.record(messages, json_mode)?;
        Ok(self.reply.clone())
    }

    fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream, LlmError> {
        self.record(messages, false)?;
        Ok(Box::new(self.tokens.clone().into_iter()))
    }
}
