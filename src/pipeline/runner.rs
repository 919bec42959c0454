//! Pipeline orchestrator — owns the engines, the engine gate and the
//! registered pipelines.
//!
//! [`PipelineOrchestrator`] is built once at startup from the configured
//! pipeline names.  Each pipeline gets its own [`ConversationHistory`]
//! (persisted to the shared history file) but all of them share one
//! [`EngineGate`], so only one generation runs at a time system-wide.
//!
//! # Request flow
//!
//! ```text
//! robot.command(wav)        ─▶ spawn_blocking(stt) ─▶ router ─┬─▶ response
//!                                                             └─▶ gate ─▶ llm ─▶ response
//! assistant.chat(wav)       ─▶ spawn_blocking(stt) ─▶ gate ─▶ llm stream ─▶ segment ─▶ tts ─▶ wav
//! assistant.chat_stream(wav)─▶ … same, each sentence framed and sent as soon as synthesized
//! status()                  ─▶ never touches the gate
//! ```
//!
//! All blocking work (HTTP backends) is pushed onto
//! `tokio::task::spawn_blocking` so the async runtime never stalls.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinError;

use crate::config::AppConfig;
use crate::llm::{resolve_system_prompt, ConversationHistory, GenerationEngine, LlmError};
use crate::stt::{SpeechRecognizer, SttError};
use crate::tts::{AudioError, SpeechSynthesizer, TtsError};

use super::assistant::AssistantPipeline;
use super::gate::EngineGate;
use super::registry::PipelineKind;
use super::robot::RobotPipeline;
use super::state::{ModelSummary, StatusReport};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside a pipeline request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The transcript was empty or blank.
    #[error("no speech detected")]
    NoSpeech,

    /// The requested pipeline was not enabled in the configuration.
    #[error("pipeline '{0}' is not loaded")]
    NotLoaded(PipelineKind),

    /// A pipeline that speaks was enabled without a synthesizer.
    #[error("pipeline '{0}' requires a speech synthesizer")]
    MissingSynthesizer(PipelineKind),

    #[error("transcription failed: {0}")]
    Stt(#[from] SttError),

    #[error("generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("synthesis failed: {0}")]
    Tts(#[from] TtsError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    /// A blocking task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(#[from] JoinError),
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Run the recognizer on the blocking pool; blank text is `NoSpeech`.
pub(crate) async fn transcribe(
    stt: &Arc<dyn SpeechRecognizer>,
    wav: Vec<u8>,
) -> Result<String, PipelineError> {
    let stt = Arc::clone(stt);
    let text = tokio::task::spawn_blocking(move || stt.transcribe(&wav)).await??;
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::NoSpeech);
    }
    Ok(text.to_string())
}

/// Round `secs` to `places` decimals for reporting.
pub(crate) fn round_secs(secs: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (secs * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

/// The external collaborators shared by every pipeline.
#[derive(Clone)]
pub struct Engines {
    pub stt: Arc<dyn SpeechRecognizer>,
    pub llm: Arc<dyn GenerationEngine>,
    /// Only required when a pipeline that speaks is enabled.
    pub tts: Option<Arc<dyn SpeechSynthesizer>>,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Hosts the enabled pipelines.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use robot_voice::config::AppConfig;
/// use robot_voice::llm::ApiEngine;
/// use robot_voice::pipeline::{Engines, PipelineOrchestrator};
/// use robot_voice::stt::ApiRecognizer;
/// use robot_voice::tts::ApiSynthesizer;
///
/// let config = AppConfig::default();
/// let engines = Engines {
///     stt: Arc::new(ApiRecognizer::from_config(&config.stt)),
///     llm: Arc::new(ApiEngine::from_config(&config.llm)),
///     tts: Some(Arc::new(ApiSynthesizer::from_config(&config.tts))),
/// };
/// let orchestrator = PipelineOrchestrator::from_config(&config, engines).unwrap();
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let response = rt
///     .block_on(orchestrator.robot().unwrap().command_text("avanza dos metros"))
///     .unwrap();
/// println!("{}", serde_json::to_string(&response).unwrap());
/// ```
pub struct PipelineOrchestrator {
    started: Instant,
    gate: EngineGate,
    robot: Option<RobotPipeline>,
    assistant: Option<AssistantPipeline>,
    loaded: Vec<PipelineKind>,
    models: ModelSummary,
    models_loaded: bool,
}

impl PipelineOrchestrator {
    /// An orchestrator with no pipelines; only [`status`](Self::status) is
    /// useful.
    pub fn status_only(config: &AppConfig) -> Self {
        log::info!("no pipelines configured, serving status only");
        Self {
            started: Instant::now(),
            gate: EngineGate::new(),
            robot: None,
            assistant: None,
            loaded: Vec::new(),
            models: ModelSummary::new(config, None),
            models_loaded: false,
        }
    }

    /// Register the pipelines named in `config.pipelines`.
    pub fn from_config(config: &AppConfig, engines: Engines) -> Result<Self, PipelineError> {
        let kinds = PipelineKind::parse_list(&config.pipelines);
        Self::with_pipelines(&kinds, config, engines)
    }

    /// Register exactly `kinds`.
    pub fn with_pipelines(
        kinds: &[PipelineKind],
        config: &AppConfig,
        engines: Engines,
    ) -> Result<Self, PipelineError> {
        if kinds.is_empty() {
            return Ok(Self::status_only(config));
        }

        let gate = EngineGate::new();
        let history_file = config.history.resolved_file();
        let mut robot = None;
        let mut assistant = None;

        for &kind in kinds {
            let prompt = resolve_system_prompt(
                kind.name(),
                config.prompt_override(kind.name()),
                kind.default_system_prompt(),
            );
            let history = Arc::new(ConversationHistory::new(
                kind.name(),
                prompt,
                config.history.max_turns,
                Some(history_file.clone()),
            ));

            match kind {
                PipelineKind::Robot => {
                    robot = Some(RobotPipeline::new(
                        Arc::clone(&engines.stt),
                        Arc::clone(&engines.llm),
                        gate.clone(),
                        history,
                    ));
                }
                PipelineKind::Assistant => {
                    let tts = engines
                        .tts
                        .clone()
                        .ok_or(PipelineError::MissingSynthesizer(kind))?;
                    assistant = Some(AssistantPipeline::new(
                        Arc::clone(&engines.stt),
                        Arc::clone(&engines.llm),
                        tts,
                        gate.clone(),
                        history,
                    ));
                }
            }
            log::info!("pipeline '{kind}' loaded (tts={})", kind.requires_tts());
        }

        let voice = engines
            .tts
            .as_ref()
            .filter(|_| assistant.is_some())
            .map(|tts| tts.voice());
        let models = ModelSummary::new(config, voice);

        Ok(Self {
            started: Instant::now(),
            gate,
            robot,
            assistant,
            loaded: kinds.to_vec(),
            models,
            models_loaded: true,
        })
    }

    pub fn robot(&self) -> Result<&RobotPipeline, PipelineError> {
        self.robot
            .as_ref()
            .ok_or(PipelineError::NotLoaded(PipelineKind::Robot))
    }

    pub fn assistant(&self) -> Result<&AssistantPipeline, PipelineError> {
        self.assistant
            .as_ref()
            .ok_or(PipelineError::NotLoaded(PipelineKind::Assistant))
    }

    /// Enabled pipelines in registration order.
    pub fn loaded(&self) -> &[PipelineKind] {
        &self.loaded
    }

    /// Clear the history of `kind`.
    pub fn reset(&self, kind: PipelineKind) -> Result<(), PipelineError> {
        match kind {
            PipelineKind::Robot => self.robot()?.reset(),
            PipelineKind::Assistant => self.assistant()?.reset(),
        }
        Ok(())
    }

    /// Liveness report.  Never waits for the engine gate.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            status: "ok",
            models_loaded: self.models_loaded,
            uptime_seconds: self.started.elapsed().as_secs(),
            pipelines: self.loaded.iter().map(|k| k.name().to_string()).collect(),
            engine_busy: self.gate.is_busy(),
            config: self.models.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
