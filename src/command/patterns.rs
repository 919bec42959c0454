//! Ordered command rule table.
//!
//! The table is evaluated top to bottom and the first matching rule wins, so
//! its order *is* the disambiguation policy:
//!
//! ```text
//! stop → sleep → wake → dance → move (fwd, back)
//!      → turn (verb+left, left, verb+right, right, generic) → grab → release → look
//! ```
//!
//! Stop sits first so a stop keyword always beats overlapping movement
//! vocabulary.  Specific turn rules sit before their bare-direction and
//! generic fallbacks.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::action::{number_value, ActionKind, Params};

// ---------------------------------------------------------------------------
// RuleParam
// ---------------------------------------------------------------------------

/// A default parameter attached to a rule.
#[derive(Debug, Clone, Copy)]
pub enum RuleParam {
    Text(&'static str),
    Number(f64),
}

impl RuleParam {
    fn to_value(self) -> Value {
        match self {
            RuleParam::Text(s) => Value::from(s),
            RuleParam::Number(n) => number_value(n),
        }
    }
}

// ---------------------------------------------------------------------------
// PatternRule
// ---------------------------------------------------------------------------

/// One row of the table: trigger, kind, defaults and spoken confirmation.
#[derive(Debug)]
pub struct PatternRule {
    trigger: Regex,
    kind: ActionKind,
    defaults: &'static [(&'static str, RuleParam)],
    confirmation: &'static str,
}

impl PatternRule {
    fn new(
        pattern: &str,
        kind: ActionKind,
        defaults: &'static [(&'static str, RuleParam)],
        confirmation: &'static str,
    ) -> Self {
        let trigger = Regex::new(&format!("(?i){pattern}")).expect("static rule pattern");
        Self {
            trigger,
            kind,
            defaults,
            confirmation,
        }
    }

    /// Unanchored search anywhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.trigger.is_match(text)
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn confirmation(&self) -> &'static str {
        self.confirmation
    }

    /// A fresh copy of the rule's default parameters.
    pub fn default_params(&self) -> Params {
        self.defaults
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_value()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Rule definitions
// ---------------------------------------------------------------------------

const TURN_VERBS: &str = "gira|tuerce|rota|dobla|voltea|da la vuelta|date la vuelta";

const FORWARD: &[(&str, RuleParam)] = &[
    ("direction", RuleParam::Text("forward")),
    ("distance", RuleParam::Number(1.0)),
];
const BACKWARD: &[(&str, RuleParam)] = &[
    ("direction", RuleParam::Text("backward")),
    ("distance", RuleParam::Number(1.0)),
];
const LEFT: &[(&str, RuleParam)] = &[
    ("direction", RuleParam::Text("left")),
    ("angle", RuleParam::Number(90.0)),
];
const RIGHT: &[(&str, RuleParam)] = &[
    ("direction", RuleParam::Text("right")),
    ("angle", RuleParam::Number(90.0)),
];
const LOOK: &[(&str, RuleParam)] = &[("angle", RuleParam::Number(30.0))];
const NONE: &[(&str, RuleParam)] = &[];

static TABLE: LazyLock<PatternTable> = LazyLock::new(PatternTable::build);

// ---------------------------------------------------------------------------
// PatternTable
// ---------------------------------------------------------------------------

/// Process-wide ordered rule list.
#[derive(Debug)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    /// The shared table instance.
    pub fn global() -> &'static PatternTable {
        &TABLE
    }

    fn build() -> Self {
        use ActionKind::*;

        let rules = vec![
            // Safety first.
            PatternRule::new(
                r"\b(para|stop|detente|quieto|frena|basta|alto|no te muevas)\b",
                Stop,
                NONE,
                "Detenido",
            ),
            PatternRule::new(
                r"\b(duerme|duérmete|a dormir|descansa|reposo|modo reposo|relájate)\b",
                Sleep,
                NONE,
                "Entrando en reposo",
            ),
            PatternRule::new(
                r"\b(despierta|arriba|actívate|espabila|levanta|vamos)\b",
                Wake,
                NONE,
                "Despertando",
            ),
            PatternRule::new(
                r"\b(baila|bailar|menéate|mueve el esqueleto)\b",
                Dance,
                NONE,
                "¡A bailar!",
            ),
            PatternRule::new(
                r"\b(avanza|adelante|hacia adelante|camina|muévete|ve|anda|sigue|pa'?lante)\b",
                Move,
                FORWARD,
                "Avanzando",
            ),
            PatternRule::new(
                r"\b(retrocede|atrás|hacia atrás|marcha atrás|pa'?trás|recular)\b",
                Move,
                BACKWARD,
                "Retrocediendo",
            ),
            PatternRule::new(
                &format!(r"\b({TURN_VERBS}).*izquierda\b"),
                Turn,
                LEFT,
                "Girando a la izquierda",
            ),
            PatternRule::new(r"\bizquierda\b", Turn, LEFT, "Girando a la izquierda"),
            PatternRule::new(
                &format!(r"\b({TURN_VERBS}).*derecha\b"),
                Turn,
                RIGHT,
                "Girando a la derecha",
            ),
            PatternRule::new(r"\bderecha\b", Turn, RIGHT, "Girando a la derecha"),
            // No direction keyword: default right.
            PatternRule::new(
                &format!(
                    r"\b({TURN_VERBS}|da una vuelta|vuelta completa|giro completo|media vuelta|cuarto de vuelta)\b"
                ),
                Turn,
                RIGHT,
                "Girando",
            ),
            PatternRule::new(r"\b(agarra|coge|sujeta|toma)\b", Grab, NONE, "Agarrando"),
            PatternRule::new(r"\b(suelta|libera|deja|soltar)\b", Release, NONE, "Soltando"),
            PatternRule::new(
                r"\b(mira.*arriba|levanta.*cabeza)\b",
                LookUp,
                LOOK,
                "Mirando arriba",
            ),
            PatternRule::new(
                r"\b(mira.*abajo|baja.*cabeza)\b",
                LookDown,
                LOOK,
                "Mirando abajo",
            ),
        ];

        Self { rules }
    }

    /// First rule whose trigger occurs in `text`.
    pub fn first_match(&self, text: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    /// The highest-priority rule (the safety stop).
    pub fn safety_rule(&self) -> &PatternRule {
        &self.rules[0]
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static PatternTable {
        PatternTable::global()
    }

    #[test]
    fn table_order_is_priority_order() {
        let kinds: Vec<ActionKind> = table().rules().iter().map(PatternRule::kind).collect();
        use ActionKind::*;
        assert_eq!(
            kinds,
            vec![
                Stop, Sleep, Wake, Dance, Move, Move, Turn, Turn, Turn, Turn, Turn, Grab, Release,
                LookUp, LookDown
            ]
        );
        assert_eq!(table().safety_rule().kind(), Stop);
    }

    #[test]
    fn stop_wins_over_movement_vocabulary() {
        let rule = table().first_match("avanza no te muevas").unwrap();
        assert_eq!(rule.kind(), ActionKind::Stop);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(table().first_match("BAILA").unwrap().kind(), ActionKind::Dance);
        assert_eq!(table().first_match("Atrás").unwrap().kind(), ActionKind::Move);
    }

    #[test]
    fn word_boundaries_prevent_partial_hits() {
        // "separa" contains "para".
        assert!(table().first_match("separa").is_none());
        assert!(table().first_match("canta una canción").is_none());
    }

    #[test]
    fn specific_turn_precedes_bare_direction() {
        let rule = table().first_match("gira a la izquierda").unwrap();
        assert_eq!(rule.confirmation(), "Girando a la izquierda");
        assert_eq!(rule.default_params()["direction"], Value::from("left"));

        let generic = table().first_match("da la vuelta").unwrap();
        assert_eq!(generic.confirmation(), "Girando");
        assert_eq!(generic.default_params()["direction"], Value::from("right"));
    }

    #[test]
    fn default_params_are_fresh_copies() {
        let rule = table().first_match("avanza").unwrap();
        let mut params = rule.default_params();
        params.insert("distance".into(), Value::from(9));
        assert_eq!(rule.default_params()["distance"], Value::from(1));
    }
}
