//! Keyword-first command router.
//!
//! [`CommandRouter::route`] resolves common spoken commands with plain
//! pattern matching, in about a millisecond.  It returns `None` when nothing
//! deterministic applies; the caller then asks the language model instead.
//!
//! # Routing steps
//!
//! ```text
//! raw text
//!   └─▶ normalise (drop fillers, lowercase, collapse spaces)
//!         ├─ empty → None
//!         └─ split on "y", "luego", "," …
//!               ├─ every segment matches, one is a stop → [stop]
//!               ├─ every segment matches                → [a1 … aN]
//!               └─ a segment misses
//!                     ├─ stop + movement keyword anywhere → [stop]
//!                     └─ otherwise                        → None
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::action::{number_value, Action, ActionKind, ActionList};
use super::lexicon::NumericLexicon;
use super::patterns::{PatternRule, PatternTable};

// ---------------------------------------------------------------------------
// Static patterns
// ---------------------------------------------------------------------------

static FILLERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(oye|eh|hey|robot|por favor|porfa|venga|puedes)\b|[¿¡]")
        .expect("static regex")
});

static COMPOUND_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*,\s+(?:(?:luego|después)\s+)?|\s+y\s+(?:(?:luego|después)\s+)?|\s+(?:luego|después)\s+",
    )
    .expect("static regex")
});

static FULL_TURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(vuelta completa|giro completo|360)\b").expect("static regex")
});
static HALF_TURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmedia vuelta\b").expect("static regex"));
static QUARTER_TURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcuarto de vuelta\b").expect("static regex"));

// The unit may be glued to its digits ("2metros").
static METERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\b|\d)(metros?)\b").expect("static regex"));
static DEGREES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\b|\d)(grados?)\b").expect("static regex"));

// ---------------------------------------------------------------------------
// CommandRouter
// ---------------------------------------------------------------------------

/// Deterministic Spanish command interpreter.
///
/// Stateless and `Send + Sync`; a single instance can serve every request.
#[derive(Debug, Clone, Copy)]
pub struct CommandRouter {
    table: &'static PatternTable,
    lexicon: &'static NumericLexicon,
}

impl CommandRouter {
    /// Router over the process-wide table and lexicon.
    pub fn new() -> Self {
        Self {
            table: PatternTable::global(),
            lexicon: NumericLexicon::global(),
        }
    }

    /// Resolve `raw_text` into actions, or `None` to defer to the LLM.
    pub fn route(&self, raw_text: &str) -> Option<ActionList> {
        let text = normalize(raw_text);
        if text.is_empty() {
            return None;
        }

        let segments = self.split_compound(&text);
        let mut actions = Vec::with_capacity(segments.len());
        for segment in &segments {
            match self.match_single(segment) {
                Some(action) => actions.push(action),
                None if self.stop_with_movement(&text) => return Some(self.stop(&text)),
                None => {
                    log::debug!("router: segment {segment:?} unmatched, deferring");
                    return None;
                }
            }
        }

        if actions.iter().any(|a| a.kind() == ActionKind::Stop) {
            return Some(self.stop(&text));
        }
        ActionList::new(actions)
    }

    /// Match one command fragment against the table.
    pub fn match_single(&self, segment: &str) -> Option<Action> {
        let segment = segment.trim().to_lowercase();
        if segment.is_empty() {
            return None;
        }
        let rule = self.table.first_match(&segment)?;
        Some(self.build_action(rule, &segment))
    }

    /// Split on conjunctive connectors, keeping number phrases such as
    /// `"cuarenta y cinco"` intact.
    pub fn split_compound(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut start = 0;

        for sep in COMPOUND_SEPARATOR.find_iter(text) {
            if sep.as_str().trim().eq_ignore_ascii_case("y") && self.joins_number(text, sep) {
                continue;
            }
            segments.push(&text[start..sep.start()]);
            start = sep.end();
        }
        segments.push(&text[start..]);

        segments
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn joins_number(&self, text: &str, sep: regex::Match<'_>) -> bool {
        let before = text[..sep.start()].split_whitespace().next_back();
        let after = text[sep.end()..].split_whitespace().next();
        match (before, after) {
            (Some(b), Some(a)) => self.lexicon.is_number_phrase(&format!("{b} y {a}")),
            _ => false,
        }
    }

    /// A stop keyword next to movement vocabulary, anywhere in `text`.
    fn stop_with_movement(&self, text: &str) -> bool {
        self.table.safety_rule().matches(text)
            && self
                .table
                .rules()
                .iter()
                .any(|r| matches!(r.kind(), ActionKind::Move | ActionKind::Turn) && r.matches(text))
    }

    fn stop(&self, text: &str) -> ActionList {
        ActionList::single(self.build_action(self.table.safety_rule(), text))
    }

    fn build_action(&self, rule: &PatternRule, text: &str) -> Action {
        let mut params = rule.default_params();

        match rule.kind() {
            ActionKind::Move => {
                if let Some(distance) = self.quantity(text, &METERS) {
                    params.insert("distance".into(), number_value(distance));
                }
            }
            ActionKind::Turn => {
                if let Some(angle) = self.turn_angle(text) {
                    params.insert("angle".into(), number_value(angle));
                }
            }
            ActionKind::LookUp | ActionKind::LookDown => {
                if let Some(angle) = self.quantity(text, &DEGREES) {
                    params.insert("angle".into(), number_value(angle));
                }
            }
            _ => {}
        }

        Action::new(rule.kind(), params, rule.confirmation())
    }

    fn turn_angle(&self, text: &str) -> Option<f64> {
        if FULL_TURN.is_match(text) {
            Some(360.0)
        } else if HALF_TURN.is_match(text) {
            Some(180.0)
        } else if QUARTER_TURN.is_match(text) {
            Some(90.0)
        } else {
            self.quantity(text, &DEGREES)
        }
    }

    fn quantity(&self, text: &str, unit: &Regex) -> Option<f64> {
        let found = unit.captures(text)?.get(1)?;
        self.lexicon.quantity_before(text, found.start())
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for `CommandRouter::new().route(text)`.
pub fn route_command(text: &str) -> Option<ActionList> {
    CommandRouter::new().route(text)
}

/// Drop vocatives and courtesy words, lowercase and collapse whitespace.
fn normalize(raw: &str) -> String {
    let stripped = FILLERS.replace_all(raw, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
