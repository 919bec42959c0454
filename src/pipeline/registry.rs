//! The fixed set of pipelines and their selection from configuration.

use std::fmt;

use crate::llm::{ASSISTANT_SYSTEM_PROMPT, ROBOT_SYSTEM_PROMPT};

/// A pipeline the service knows how to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Voice command → JSON actions, keyword routing with LLM fallback.
    Robot,
    /// Conversational assistant with streamed speech output.
    Assistant,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Robot, PipelineKind::Assistant];

    pub fn name(self) -> &'static str {
        match self {
            PipelineKind::Robot => "robot",
            PipelineKind::Assistant => "assistant",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn default_system_prompt(self) -> &'static str {
        match self {
            PipelineKind::Robot => ROBOT_SYSTEM_PROMPT,
            PipelineKind::Assistant => ASSISTANT_SYSTEM_PROMPT,
        }
    }

    /// Whether the pipeline needs a speech synthesizer.
    pub fn requires_tts(self) -> bool {
        matches!(self, PipelineKind::Assistant)
    }

    /// Parse configured names, skipping (and logging) unknown ones and
    /// duplicates.  Order is preserved.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<PipelineKind> {
        let mut kinds = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            match Self::from_name(name) {
                Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Some(_) => log::warn!("pipeline '{name}' listed twice, ignoring"),
                None => log::error!("pipeline '{name}' not found, skipping"),
            }
        }
        kinds
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in PipelineKind::ALL {
            assert_eq!(PipelineKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PipelineKind::from_name(" Robot "), Some(PipelineKind::Robot));
        assert_eq!(PipelineKind::from_name("weather"), None);
    }

    #[test]
    fn list_parsing_skips_unknown_and_duplicates() {
        let kinds = PipelineKind::parse_list(&["assistant", "", "weather", "robot", "assistant"]);
        assert_eq!(kinds, vec![PipelineKind::Assistant, PipelineKind::Robot]);
        assert!(PipelineKind::parse_list::<&str>(&[]).is_empty());
    }

    #[test]
    fn only_assistant_needs_tts() {
        assert!(!PipelineKind::Robot.requires_tts());
        assert!(PipelineKind::Assistant.requires_tts());
    }
}
