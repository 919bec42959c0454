//! Spanish voice front-end for a mobile robot.
//!
//! * [`command`] — deterministic command router (keywords → JSON actions).
//! * [`llm`] — chat-completions backend, sentence segmenter, history.
//! * [`stt`] / [`tts`] — speech recognition and synthesis backends.
//! * [`pipeline`] — robot and assistant request flows behind one engine gate.
//! * [`config`] — `settings.toml` persistence.

pub mod command;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod stt;
pub mod tts;
