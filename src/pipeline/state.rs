//! Liveness/status report of the service.
//!
//! [`StatusReport`] is produced by
//! [`PipelineOrchestrator::status`](super::PipelineOrchestrator::status)
//! without waiting for the engine gate, so it answers even while a long
//! generation is running.

use serde::Serialize;

use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// ModelSummary
// ---------------------------------------------------------------------------

/// Identifiers of the models behind each backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub llm: String,
    pub whisper: String,
    /// Voice name, or `"not loaded"` when no pipeline speaks.
    pub tts: String,
}

impl ModelSummary {
    pub const NOT_LOADED: &'static str = "not loaded";

    pub fn new(config: &AppConfig, voice: Option<&str>) -> Self {
        Self {
            llm: config.llm.model.clone(),
            whisper: config.stt.model.clone(),
            tts: voice.unwrap_or(Self::NOT_LOADED).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusReport
// ---------------------------------------------------------------------------

/// Snapshot returned by the status query.
///
/// ```
/// use robot_voice::config::AppConfig;
/// use robot_voice::pipeline::PipelineOrchestrator;
///
/// let status = PipelineOrchestrator::status_only(&AppConfig::default()).status();
/// assert_eq!(status.status, "ok");
/// assert!(status.pipelines.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Always `"ok"` while the process is serving.
    pub status: &'static str,
    /// `true` once the engines of at least one pipeline are registered.
    pub models_loaded: bool,
    pub uptime_seconds: u64,
    /// Names of the registered pipelines.
    pub pipelines: Vec<String>,
    /// `true` while a generation holds the engine gate.
    pub engine_busy: bool,
    pub config: ModelSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_missing_voice() {
        let config = AppConfig::default();
        let summary = ModelSummary::new(&config, None);
        assert_eq!(summary.whisper, "base");
        assert_eq!(summary.tts, ModelSummary::NOT_LOADED);
        assert_eq!(ModelSummary::new(&config, Some("es_ES")).tts, "es_ES");
    }

    #[test]
    fn report_serializes_for_clients() {
        let report = StatusReport {
            status: "ok",
            models_loaded: true,
            uptime_seconds: 12,
            pipelines: vec!["robot".into()],
            engine_busy: false,
            config: ModelSummary::new(&AppConfig::default(), None),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["uptime_seconds"], 12);
        assert_eq!(json["pipelines"][0], "robot");
        assert_eq!(json["config"]["tts"], "not loaded");
    }
}
