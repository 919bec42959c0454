//! Deterministic robot command interpretation.
//!
//! This module provides:
//! * [`CommandRouter`] — keyword-first Spanish command router (`route`).
//! * [`PatternTable`] / [`PatternRule`] — the ordered rule table.
//! * [`NumericLexicon`] — Spanish number words and digit literals.
//! * [`Action`] / [`ActionList`] / [`ActionKind`] — structured output and its
//!   `{"actions": [...]}` wire format.
//!
//! # Quick start
//!
//! ```rust
//! use robot_voice::command::{ActionKind, CommandRouter};
//!
//! let router = CommandRouter::new();
//! let list = router.route("avanza dos metros y gira a la derecha").unwrap();
//! assert_eq!(list.kinds(), vec![ActionKind::Move, ActionKind::Turn]);
//!
//! // Unknown phrases defer to the language model.
//! assert!(router.route("cuál es la capital de Francia").is_none());
//! ```

pub mod action;
pub mod lexicon;
pub mod patterns;
pub mod router;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use action::{number_value, Action, ActionKind, ActionList, CommandError, Params};
pub use lexicon::NumericLexicon;
pub use patterns::{PatternRule, PatternTable, RuleParam};
pub use router::{route_command, CommandRouter};
