//! Structured robot actions and their wire format.
//!
//! An [`ActionList`] serialises to the JSON shape the robot firmware expects:
//!
//! ```text
//! {"actions": [{"action": "move", "params": {"direction": "forward", "distance": 2}}]}
//! ```
//!
//! The confirmation text is local to the server (it is spoken or shown back
//! to the user) and is never part of the wire format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CommandError
// ---------------------------------------------------------------------------

/// Errors raised while building or decoding action lists.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An action list must hold at least one action.
    #[error("action list is empty")]
    EmptyActionList,

    /// The JSON payload did not match the `{"actions": [...]}` shape.
    #[error("invalid action payload: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Kind tag of a single robot instruction.
///
/// Unrecognised tags coming back from the language model decode as
/// [`ActionKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Turn,
    Stop,
    Sleep,
    Wake,
    Dance,
    Grab,
    Release,
    LookUp,
    LookDown,
    Error,
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    /// Wire name of the kind (`"look_up"`, `"move"`, …).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Turn => "turn",
            ActionKind::Stop => "stop",
            ActionKind::Sleep => "sleep",
            ActionKind::Wake => "wake",
            ActionKind::Dance => "dance",
            ActionKind::Grab => "grab",
            ActionKind::Release => "release",
            ActionKind::LookUp => "look_up",
            ActionKind::LookDown => "look_down",
            ActionKind::Unknown => "unknown",
            ActionKind::Error => "error",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Named action parameters. Sorted keys keep the serialised form stable.
pub type Params = BTreeMap<String, Value>;

/// Convert a numeric parameter into a JSON value, keeping whole numbers as
/// integers so `2.0` goes over the wire as `2`.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One structured robot instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action")]
    kind: ActionKind,
    #[serde(default)]
    params: Params,
    #[serde(skip)]
    confirmation: String,
}

impl Action {
    pub fn new(kind: ActionKind, params: Params, confirmation: impl Into<String>) -> Self {
        Self {
            kind,
            params,
            confirmation: confirmation.into(),
        }
    }

    /// An `error` action carrying the raw text that could not be decoded.
    pub fn error(raw: impl Into<String>) -> Self {
        let mut params = Params::new();
        params.insert("raw".into(), Value::String(raw.into()));
        Self::new(ActionKind::Error, params, "")
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn confirmation(&self) -> &str {
        &self.confirmation
    }

    /// Numeric parameter lookup (`distance`, `angle`).
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(Value::as_f64)
    }

    /// String parameter lookup (`direction`).
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// ActionList
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ActionListRepr {
    actions: Vec<Action>,
}

impl TryFrom<ActionListRepr> for ActionList {
    type Error = CommandError;

    fn try_from(repr: ActionListRepr) -> Result<Self, Self::Error> {
        ActionList::new(repr.actions).ok_or(CommandError::EmptyActionList)
    }
}

/// Ordered, non-empty list of actions parsed from one utterance.
///
/// Index order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActionListRepr")]
pub struct ActionList {
    actions: Vec<Action>,
}

impl ActionList {
    /// Wrap `actions`; returns `None` when the list is empty.
    pub fn new(actions: Vec<Action>) -> Option<Self> {
        if actions.is_empty() {
            None
        } else {
            Some(Self { actions })
        }
    }

    pub fn single(action: Action) -> Self {
        Self {
            actions: vec![action],
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(Action::kind).collect()
    }

    /// Per-action confirmations joined with `". "`, empty ones skipped.
    pub fn confirmation(&self) -> String {
        self.actions
            .iter()
            .map(Action::confirmation)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(". ")
    }

    pub fn to_json(&self) -> Value {
        // Serialising plain maps and strings cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    pub fn from_json_str(s: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Interpret free-form model output as an action list.
    ///
    /// * valid `{"actions": [...]}` → decoded as is
    /// * any other JSON object → wrapped as a single action
    /// * anything else → one `error` action holding the raw text
    pub fn from_model_output(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return Self::single(Action::error(raw)),
        };

        let wrapped = if value.get("actions").is_some() {
            value
        } else if value.is_object() {
            serde_json::json!({ "actions": [value] })
        } else {
            return Self::single(Action::error(raw));
        };

        serde_json::from_value(wrapped).unwrap_or_else(|e| {
            log::warn!("model output is not a valid action list: {e}");
            Self::single(Action::error(raw))
        })
    }
}

impl IntoIterator for ActionList {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn move_forward(distance: f64) -> Action {
        let mut p = Params::new();
        p.insert("direction".into(), Value::from("forward"));
        p.insert("distance".into(), number_value(distance));
        Action::new(ActionKind::Move, p, "Avanzando")
    }

    fn turn_right() -> Action {
        let mut p = Params::new();
        p.insert("direction".into(), Value::from("right"));
        p.insert("angle".into(), number_value(90.0));
        Action::new(ActionKind::Turn, p, "Girando a la derecha")
    }

    #[test]
    fn serialises_to_wire_shape() {
        let list = ActionList::new(vec![move_forward(2.0)]).unwrap();
        assert_eq!(
            list.to_json_string(),
            r#"{"actions":[{"action":"move","params":{"direction":"forward","distance":2}}]}"#
        );
    }

    #[test]
    fn fractional_numbers_stay_floats() {
        let list = ActionList::single(move_forward(0.5));
        assert_eq!(list.actions()[0].params()["distance"], Value::from(0.5));
    }

    #[test]
    fn json_round_trip_preserves_kind_params_and_order() {
        let list = ActionList::new(vec![move_forward(1.5), turn_right(), move_forward(3.0)]).unwrap();
        let decoded = ActionList::from_json_str(&list.to_json_string()).unwrap();

        assert_eq!(
            decoded.kinds(),
            vec![ActionKind::Move, ActionKind::Turn, ActionKind::Move]
        );
        for (a, b) in list.actions().iter().zip(decoded.actions()) {
            assert_eq!(a.params(), b.params());
        }
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(ActionList::new(Vec::new()).is_none());
        assert!(ActionList::from_json_str(r#"{"actions": []}"#).is_err());
    }

    #[test]
    fn confirmation_skips_empty_entries() {
        let silent = Action::new(ActionKind::Dance, Params::new(), "");
        let list = ActionList::new(vec![move_forward(1.0), silent, turn_right()]).unwrap();
        assert_eq!(list.confirmation(), "Avanzando. Girando a la derecha");
    }

    #[test]
    fn model_output_with_actions_is_decoded() {
        let raw = r#"{"actions":[{"action":"turn","params":{"direction":"left","angle":45}}]}"#;
        let list = ActionList::from_model_output(raw);
        assert_eq!(list.kinds(), vec![ActionKind::Turn]);
        assert_eq!(list.actions()[0].param_f64("angle"), Some(45.0));
        assert_eq!(list.actions()[0].param_str("direction"), Some("left"));
    }

    #[test]
    fn bare_action_object_is_wrapped() {
        let list = ActionList::from_model_output(r#"{"action":"stop","params":{}}"#);
        assert_eq!(list.kinds(), vec![ActionKind::Stop]);
    }

    #[test]
    fn unknown_kind_from_model_decodes_as_unknown() {
        let raw = r#"{"actions":[{"action":"call","params":{"original":"llama a mi madre"}}]}"#;
        let list = ActionList::from_model_output(raw);
        assert_eq!(list.kinds(), vec![ActionKind::Unknown]);
        assert_eq!(list.actions()[0].param_str("original"), Some("llama a mi madre"));
    }

    #[test]
    fn non_json_output_becomes_error_action() {
        let list = ActionList::from_model_output("lo siento, no entiendo");
        assert_eq!(list.kinds(), vec![ActionKind::Error]);
        assert_eq!(list.actions()[0].param_str("raw"), Some("lo siento, no entiendo"));
    }
}
