use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of turns retained per session. Older turns are dropped when new
/// ones are appended.
pub const HISTORY_WINDOW: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One exchange entry. Turns are append-only and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), timestamp: Utc::now() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self { role: Role::Agent, text: text.into(), timestamp: Utc::now() }
    }
}

/// In-memory, per-session conversation log bounded to [`HISTORY_WINDOW`]
/// turns. Lives only for the session lifetime; nothing is persisted.
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if self.turns.len() > HISTORY_WINDOW {
            let excess = self.turns.len() - HISTORY_WINDOW;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
