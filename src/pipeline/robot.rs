//! Robot command pipeline: speech → JSON actions.
//!
//! ```text
//! wav ─▶ transcribe ─▶ CommandRouter::route ──Some──▶ actions   (keyword, ~1 ms)
//!                              │
//!                              └─None──▶ [gate] LLM, JSON mode ─▶ actions (llm)
//! ```
//!
//! Both paths record the exchange in the pipeline's history; the keyword
//! path stores the serialized actions as the assistant turn so the model
//! sees a consistent conversation.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::command::{ActionList, CommandRouter};
use crate::llm::{ConversationHistory, GenerationEngine};
use crate::stt::SpeechRecognizer;

use super::gate::EngineGate;
use super::runner::{round_secs, transcribe, PipelineError};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Which stage resolved the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutedBy {
    Keyword,
    Llm,
}

/// Stage timings in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandTiming {
    pub asr_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_seconds: Option<f64>,
    pub total_seconds: f64,
}

/// Result of one robot command.
///
/// Serializes flat: `{"transcription", "actions", "confirmation"?,
/// "_routed_by", "_timing"}`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub transcription: String,
    #[serde(flatten)]
    pub actions: ActionList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
    #[serde(rename = "_routed_by")]
    pub routed_by: RoutedBy,
    #[serde(rename = "_timing")]
    pub timing: CommandTiming,
}

// ---------------------------------------------------------------------------
// RobotPipeline
// ---------------------------------------------------------------------------

pub struct RobotPipeline {
    stt: Arc<dyn SpeechRecognizer>,
    llm: Arc<dyn GenerationEngine>,
    gate: EngineGate,
    history: Arc<ConversationHistory>,
    router: CommandRouter,
}

impl RobotPipeline {
    pub fn new(
        stt: Arc<dyn SpeechRecognizer>,
        llm: Arc<dyn GenerationEngine>,
        gate: EngineGate,
        history: Arc<ConversationHistory>,
    ) -> Self {
        Self {
            stt,
            llm,
            gate,
            history,
            router: CommandRouter::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Transcribe `wav` and resolve the spoken command.
    pub async fn command(&self, wav: Vec<u8>) -> Result<CommandResponse, PipelineError> {
        let started = Instant::now();
        let text = transcribe(&self.stt, wav).await?;
        let asr_secs = started.elapsed().as_secs_f64();
        log::info!("[robot] ASR ({asr_secs:.2}s): {text}");

        self.resolve(text, asr_secs, started).await
    }

    /// Resolve an already transcribed command.
    pub async fn command_text(&self, text: &str) -> Result<CommandResponse, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::NoSpeech);
        }
        self.resolve(text.to_string(), 0.0, Instant::now()).await
    }

    /// Clear this pipeline's conversation history.
    pub fn reset(&self) {
        self.history.clear();
        log::info!("[robot] history cleared");
    }

    async fn resolve(
        &self,
        text: String,
        asr_secs: f64,
        started: Instant,
    ) -> Result<CommandResponse, PipelineError> {
        // Fast path: deterministic keyword routing.
        if let Some(actions) = self.router.route(&text) {
            let routing_secs = started.elapsed().as_secs_f64() - asr_secs;
            log::info!(
                "[robot] KEYWORD ({routing_secs:.4}s): {text} -> {:?}",
                actions.kinds()
            );
            self.history.add_exchange(&text, &actions.to_json_string());

            return Ok(CommandResponse {
                confirmation: Some(actions.confirmation()),
                transcription: text,
                actions,
                routed_by: RoutedBy::Keyword,
                timing: CommandTiming {
                    asr_seconds: round_secs(asr_secs, 2),
                    routing_seconds: Some(round_secs(routing_secs, 4)),
                    llm_seconds: None,
                    total_seconds: round_secs(started.elapsed().as_secs_f64(), 2),
                },
            });
        }

        // Fallback: let the model produce the JSON.
        let messages = self.history.get_messages(&text);
        let llm = Arc::clone(&self.llm);
        let llm_started = Instant::now();
        let raw = self
            .gate
            .run_blocking(move || llm.generate_blocking(&messages, true))
            .await??;
        let llm_secs = llm_started.elapsed().as_secs_f64();

        log::info!(
            "[robot] LLM ({llm_secs:.2}s): {}",
            raw.chars().take(120).collect::<String>()
        );
        self.history.add_exchange(&text, &raw);

        let actions = ActionList::from_model_output(&raw);
        let total_secs = started.elapsed().as_secs_f64();
        log::info!("[robot] total pipeline: {total_secs:.2}s");

        Ok(CommandResponse {
            transcription: text,
            actions,
            confirmation: None,
            routed_by: RoutedBy::Llm,
            timing: CommandTiming {
                asr_seconds: round_secs(asr_secs, 2),
                routing_seconds: None,
                llm_seconds: Some(round_secs(llm_secs, 2)),
                total_seconds: round_secs(total_secs, 2),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ActionKind;
    use crate::pipeline::testing::ScriptedLlm;
    use crate::stt::{MockRecognizer, SttError};

    fn make_pipeline(stt: MockRecognizer, llm: Arc<ScriptedLlm>) -> RobotPipeline {
        RobotPipeline::new(
            Arc::new(stt),
            llm,
            EngineGate::new(),
            Arc::new(ConversationHistory::in_memory("robot", "solo JSON", 10)),
        )
    }

    #[tokio::test]
    async fn keyword_path_skips_the_model() {
        let llm = Arc::new(ScriptedLlm::reply("{}"));
        let robot = make_pipeline(MockRecognizer::ok("avanza dos metros"), Arc::clone(&llm));

        let response = robot.command(b"wav".to_vec()).await.unwrap();

        assert_eq!(response.routed_by, RoutedBy::Keyword);
        assert_eq!(response.transcription, "avanza dos metros");
        assert_eq!(response.actions.kinds(), vec![ActionKind::Move]);
        assert_eq!(response.actions.actions()[0].param_f64("distance"), Some(2.0));
        assert!(response.confirmation.is_some());
        assert_eq!(llm.calls(), 0);

        // The keyword exchange is part of the history.
        assert_eq!(robot.history().len(), 2);
        let messages = robot.history().get_messages("x");
        assert!(messages[2].content.contains("\"move\""));
    }

    #[tokio::test]
    async fn unmatched_text_falls_back_to_json_model() {
        let llm = Arc::new(ScriptedLlm::reply(
            r#"{"actions":[{"action":"dance","params":{}}]}"#,
        ));
        let robot = make_pipeline(MockRecognizer::ok("unused"), Arc::clone(&llm));

        let response = robot.command_text("haz algo divertido").await.unwrap();

        assert_eq!(response.routed_by, RoutedBy::Llm);
        assert_eq!(response.actions.kinds(), vec![ActionKind::Dance]);
        assert!(response.confirmation.is_none());
        assert_eq!(llm.calls(), 1);
        assert_eq!(llm.last_json_mode(), Some(true));
        assert_eq!(robot.history().len(), 2);
    }

    #[tokio::test]
    async fn malformed_model_output_becomes_error_action() {
        let llm = Arc::new(ScriptedLlm::reply("lo siento, no sé"));
        let robot = make_pipeline(MockRecognizer::ok("unused"), llm);

        let response = robot.command_text("cuál es la capital de Francia").await.unwrap();

        let action = &response.actions.actions()[0];
        assert_eq!(action.kind(), ActionKind::Error);
        assert_eq!(action.param_str("raw"), Some("lo siento, no sé"));
    }

    #[tokio::test]
    async fn bare_action_object_is_wrapped() {
        let llm = Arc::new(ScriptedLlm::reply(r#"{"action":"grab","params":{}}"#));
        let robot = make_pipeline(MockRecognizer::ok("unused"), llm);

        let response = robot.command_text("recoge la pelota roja").await.unwrap();
        assert_eq!(response.actions.kinds(), vec![ActionKind::Grab]);
    }

    #[tokio::test]
    async fn blank_transcription_is_no_speech() {
        let robot = make_pipeline(MockRecognizer::ok("   "), Arc::new(ScriptedLlm::reply("{}")));
        let err = robot.command(b"wav".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSpeech));

        let err = robot.command_text("").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoSpeech));
    }

    #[tokio::test]
    async fn recognizer_failure_is_propagated() {
        let robot = make_pipeline(
            MockRecognizer::err(SttError::Timeout),
            Arc::new(ScriptedLlm::reply("{}")),
        );
        let err = robot.command(b"wav".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Stt(SttError::Timeout)));
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let robot = make_pipeline(MockRecognizer::ok("para"), Arc::new(ScriptedLlm::reply("{}")));
        robot.command(b"wav".to_vec()).await.unwrap();
        assert!(!robot.history().is_empty());
        robot.reset();
        assert!(robot.history().is_empty());
    }

    #[tokio::test]
    async fn response_serializes_flat() {
        let robot = make_pipeline(MockRecognizer::ok("para"), Arc::new(ScriptedLlm::reply("{}")));
        let response = robot.command(b"wav".to_vec()).await.unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["transcription"], "para");
        assert_eq!(json["actions"][0]["action"], "stop");
        assert_eq!(json["_routed_by"], "keyword");
        assert!(json["_timing"]["routing_seconds"].is_number());
        assert!(json["_timing"].get("llm_seconds").is_none());
    }
}
