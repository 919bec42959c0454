//! Per-pipeline conversation history with a sliding window and JSON
//! persistence.
//!
//! All pipelines share one history file; each keeps its turns under its own
//! name, so saving one project never clobbers another:
//!
//! ```text
//! {
//!   "robot":     [{"role": "user", "content": "…"}, …],
//!   "assistant": [{"role": "user", "content": "…"}, …]
//! }
//! ```
//!
//! Persistence errors are logged and swallowed; history is a convenience,
//! never a reason to fail a request.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::llm::engine::ChatMessage;

type HistoryFile = BTreeMap<String, Vec<ChatMessage>>;

/// Serializes read-modify-write cycles on the shared file.
static FILE_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// ConversationHistory
// ---------------------------------------------------------------------------

/// Bounded, persisted chat history of a single project.
///
/// Holds at most `max_turns` user/assistant pairs; the oldest pair is
/// evicted first.
pub struct ConversationHistory {
    name: String,
    system_prompt: String,
    max_turns: usize,
    turns: Mutex<VecDeque<ChatMessage>>,
    persist_path: Option<PathBuf>,
}

impl ConversationHistory {
    /// Create a history and load any previously saved turns for `name`.
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        max_turns: usize,
        persist_path: Option<PathBuf>,
    ) -> Self {
        let history = Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            max_turns,
            turns: Mutex::new(VecDeque::with_capacity(max_turns * 2)),
            persist_path,
        };
        history.load_from_disk();
        history
    }

    /// In-memory history (no persistence).
    pub fn in_memory(name: impl Into<String>, system_prompt: impl Into<String>, max_turns: usize) -> Self {
        Self::new(name, system_prompt, max_turns, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// System prompt + stored history + the new user turn.
    pub fn get_messages(&self, user_text: &str) -> Vec<ChatMessage> {
        let turns = self.lock();
        let mut messages = Vec::with_capacity(turns.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(turns.iter().cloned());
        messages.push(ChatMessage::user(user_text));
        messages
    }

    /// Record a completed exchange and persist.
    pub fn add_exchange(&self, user_text: &str, assistant_text: &str) {
        let mut turns = self.lock();
        turns.push_back(ChatMessage::user(user_text));
        turns.push_back(ChatMessage::assistant(assistant_text));
        self.trim(&mut turns);
        self.save_to_disk(&turns);
    }

    /// Drop all turns (memory and disk).
    pub fn clear(&self) {
        let mut turns = self.lock();
        turns.clear();
        self.save_to_disk(&turns);
    }

    /// Number of stored messages (two per exchange).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, VecDeque<ChatMessage>> {
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn trim(&self, turns: &mut VecDeque<ChatMessage>) {
        let cap = self.max_turns * 2;
        while turns.len() > cap {
            turns.pop_front();
        }
    }

    fn load_from_disk(&self) {
        let Some(path) = self.persist_path.as_deref() else {
            return;
        };
        if !path.exists() {
            return;
        }
        let loaded = {
            let _file_guard = FILE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            read_file(path)
        };
        match loaded {
            Ok(mut file) => {
                let items = file.remove(&self.name).unwrap_or_default();
                let count = items.len();
                let mut turns = self.lock();
                turns.extend(items);
                self.trim(&mut turns);
                log::info!("[{}] loaded {count} messages from disk", self.name);
            }
            Err(e) => log::warn!("[{}] failed to load history: {e}", self.name),
        }
    }

    fn save_to_disk(&self, turns: &VecDeque<ChatMessage>) {
        let Some(path) = self.persist_path.as_deref() else {
            return;
        };
        let _file_guard = FILE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = (|| -> anyhow::Result<()> {
            // Preserve the other projects' histories.
            let mut file = if path.exists() {
                read_file(path)?
            } else {
                HistoryFile::new()
            };
            file.insert(self.name.clone(), turns.iter().cloned().collect());

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
            Ok(())
        })();

        if let Err(e) = result {
            log::warn!("[{}] failed to save history: {e}", self.name);
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<HistoryFile> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::engine::Role;
    use tempfile::tempdir;

    #[test]
    fn messages_wrap_history_with_system_and_user() {
        let history = ConversationHistory::in_memory("robot", "prompt", 10);
        history.add_exchange("hola", "qué tal");

        let messages = history.get_messages("avanza");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[0].content, "prompt");
        assert_eq!(messages[3].content, "avanza");
    }

    #[test]
    fn oldest_pair_is_evicted_first() {
        let history = ConversationHistory::in_memory("robot", "p", 2);
        for i in 0..5 {
            history.add_exchange(&format!("u{i}"), &format!("a{i}"));
        }
        assert_eq!(history.len(), 4);

        let messages = history.get_messages("next");
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["p", "u3", "a3", "u4", "a4", "next"]);
    }

    #[test]
    fn history_survives_reload() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("history.json");

        let history = ConversationHistory::new("robot", "p", 10, Some(path.clone()));
        history.add_exchange("para", "{\"actions\":[]}");
        drop(history);

        let reloaded = ConversationHistory::new("robot", "p", 10, Some(path));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get_messages("x")[1].content, "para");
    }

    #[test]
    fn projects_are_independent_in_one_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("history.json");

        let robot = ConversationHistory::new("robot", "p", 10, Some(path.clone()));
        let assistant = ConversationHistory::new("assistant", "p", 10, Some(path.clone()));
        robot.add_exchange("avanza", "ok");
        assistant.add_exchange("hola", "buenas");
        assistant.clear();

        let robot_again = ConversationHistory::new("robot", "p", 10, Some(path.clone()));
        let assistant_again = ConversationHistory::new("assistant", "p", 10, Some(path));
        assert_eq!(robot_again.len(), 2);
        assert!(assistant_again.is_empty());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let history = ConversationHistory::new("robot", "p", 10, Some(path));
        assert!(history.is_empty());
    }
}
