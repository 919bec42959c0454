//! Pipeline orchestrator module.
//!
//! This module composes the command router and the sentence segmenter with
//! the external speech/LLM/synthesis engines into the two request flows,
//! and serializes engine access through one gate.
//!
//! # Architecture
//!
//! ```text
//!                    PipelineOrchestrator
//!                            │
//!        ┌───────────────────┼───────────────────────┐
//!        ▼                   ▼                       ▼
//!  RobotPipeline      AssistantPipeline         status()
//!   │ router             │ segmenter               (never waits)
//!   │ history            │ history
//!   └──────┬─────────────┘
//!          ▼
//!     EngineGate  (FIFO, one generation at a time)
//!          │
//!          ▼
//!  spawn_blocking(SpeechRecognizer / GenerationEngine / SpeechSynthesizer)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use robot_voice::config::AppConfig;
//! use robot_voice::pipeline::{Engines, PipelineOrchestrator};
//! # use robot_voice::llm::GenerationEngine;
//! # use robot_voice::stt::SpeechRecognizer;
//! # fn make_stt() -> Arc<dyn SpeechRecognizer> { unimplemented!() }
//! # fn make_llm() -> Arc<dyn GenerationEngine> { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut config = AppConfig::default();
//!     config.pipelines = vec!["robot".into()];
//!
//!     let engines = Engines { stt: make_stt(), llm: make_llm(), tts: None };
//!     let orchestrator = PipelineOrchestrator::from_config(&config, engines).unwrap();
//!
//!     let wav = std::fs::read("orden.wav").unwrap();
//!     let response = orchestrator.robot().unwrap().command(wav).await.unwrap();
//!     println!("{:?}", response.actions.kinds());
//! }
//! ```

pub mod assistant;
pub mod gate;
pub mod registry;
pub mod robot;
pub mod runner;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use assistant::{AssistantPipeline, ChatAudio, ChatStream, ChatText, ChatTiming};
pub use gate::{EngineGate, GateGuard};
pub use registry::PipelineKind;
pub use robot::{CommandResponse, CommandTiming, RobotPipeline, RoutedBy};
pub use runner::{Engines, PipelineError, PipelineOrchestrator};
pub use state::{ModelSummary, StatusReport};
