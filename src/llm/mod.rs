//! Language-model side of the system.
//!
//! This module provides:
//! * [`GenerationEngine`] — blocking trait implemented by all LLM backends.
//! * [`ApiEngine`] — OpenAI-compatible chat-completions backend (blocking +
//!   SSE streaming).
//! * [`SentenceSegmenter`] — turns a token stream into speakable sentences,
//!   dropping `<think>` reasoning blocks.
//! * [`ConversationHistory`] — bounded, persisted per-pipeline chat history.
//! * [`ChatMessage`] / [`Role`] — chat-format messages.
//! * [`LlmError`] — error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use robot_voice::config::AppConfig;
//! use robot_voice::llm::{ApiEngine, ConversationHistory, GenerationEngine, SentenceSegmenter};
//!
//! let config = AppConfig::default();
//! let engine = ApiEngine::from_config(&config.llm);
//! let history = ConversationHistory::in_memory("assistant", "Eres breve.", 10);
//!
//! let messages = history.get_messages("Cuéntame un chiste");
//! let tokens = engine.generate_stream(&messages).unwrap();
//! for sentence in SentenceSegmenter::new(tokens) {
//!     println!("{sentence}"); // hand to TTS here
//! }
//! ```

pub mod engine;
pub mod history;
pub mod prompt;
pub mod segmenter;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{ApiEngine, ChatMessage, GenerationEngine, LlmError, Role, TokenStream};
pub use history::ConversationHistory;
pub use prompt::{resolve_system_prompt, ASSISTANT_SYSTEM_PROMPT, ROBOT_SYSTEM_PROMPT};
pub use segmenter::{segment, strip_reasoning, SentenceSegmenter, THINK_CLOSE, THINK_OPEN};
