//! STT (Speech-to-Text) module.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │             SpeechRecognizer (trait)                  │
//! │                                                      │
//! │   ┌─────────────┐    ┌──────────────────────────┐    │
//! │   │  SttConfig   │───▶│ ApiRecognizer            │    │
//! │   │ - base_url   │    │ POST multipart WAV       │    │
//! │   │ - model/lang │    │ /v1/audio/transcriptions │    │
//! │   └─────────────┘    └────────────┬─────────────┘    │
//! │                                   ▼                  │
//! │                         ┌──────────────────┐         │
//! │                         │  transcribe()    │         │
//! │                         │  wav → text      │         │
//! │                         └──────────────────┘         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use robot_voice::config::SttConfig;
//! use robot_voice::stt::{ApiRecognizer, SpeechRecognizer};
//!
//! let engine = ApiRecognizer::from_config(&SttConfig::default());
//! let wav = std::fs::read("orden.wav").unwrap();
//! let text = engine.transcribe(&wav).unwrap();
//! println!("{text}");
//! ```

pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{ApiRecognizer, SpeechRecognizer, SttError};

// test-only re-export so the pipeline test module can import MockRecognizer.
#[cfg(test)]
pub use engine::MockRecognizer;
