//! Roster and bounded message log.

use crate::error::DuplicateUserError;
use crate::{Config, Id, now_millis};
use std::collections::VecDeque;

/// A user in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub display_name: String,
    /// Unix milliseconds.
    pub joined_at: u64,
}

impl User {
    /// A user who joins now.
    pub fn new(id: Id, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            joined_at: now_millis(),
        }
    }
}

/// An authored chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Id,
    pub author_id: Id,
    pub author_name: String,
    pub text: String,
    /// Unix milliseconds.
    pub timestamp: u64,
}

/// One line of the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Message(Message),
    /// Informational line with no author (joins, welcome text).
    System { text: String, timestamp: u64 },
}

impl LogEntry {
    /// What the line says, authored or not.
    pub fn text(&self) -> &str {
        match self {
            LogEntry::Message(m) => &m.text,
            LogEntry::System { text, .. } => text,
        }
    }

    /// The chat message, unless this is a system line.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            LogEntry::Message(m) => Some(m),
            LogEntry::System { .. } => None,
        }
    }

    /// Whether this line has no author.
    pub fn is_system(&self) -> bool {
        matches!(self, LogEntry::System { .. })
    }
}

/// Who is here and what has been said.
#[derive(Debug)]
pub struct SessionState {
    /// Join order. Rosters are small, so lookups scan.
    roster: Vec<User>,
    log: VecDeque<LogEntry>,
    history_limit: usize,
}

impl SessionState {
    /// An empty room keeping at most `config.message_history_limit` log entries.
    pub fn new(config: &Config) -> Self {
        // The newest entry is always kept.
        let history_limit = config.message_history_limit.max(1);
        Self {
            roster: Vec::new(),
            log: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    /// Add a user. Ids are unique: a second user with a known id is rejected
    /// and the roster is left as it was.
    pub fn add_user(&mut self, user: User) -> Result<(), DuplicateUserError> {
        if self.user(&user.id).is_some() {
            return Err(DuplicateUserError { id: user.id });
        }
        self.roster.push(user);
        Ok(())
    }

    /// Look a user up by id.
    pub fn user(&self, id: &Id) -> Option<&User> {
        self.roster.iter().find(|u| &u.id == id)
    }

    /// Append a chat message, returning the entry evicted to make room.
    pub fn append_message(&mut self, message: Message) -> Option<LogEntry> {
        self.append(LogEntry::Message(message))
    }

    /// Append an unauthored line, returning the entry evicted to make room.
    pub fn append_system(&mut self, text: impl Into<String>) -> Option<LogEntry> {
        self.append(LogEntry::System {
            text: text.into(),
            timestamp: now_millis(),
        })
    }

    // Evict before pushing so the log never holds more than the limit.
    fn append(&mut self, entry: LogEntry) -> Option<LogEntry> {
        let evicted = if self.log.len() >= self.history_limit {
            self.log.pop_front()
        } else {
            None
        };
        self.log.push_back(entry);
        evicted
    }

    /// Users in join order.
    pub fn roster(&self) -> &[User] {
        &self.roster
    }

    /// Owned copy of the roster, for rendering.
    pub fn roster_snapshot(&self) -> Vec<User> {
        self.roster.clone()
    }

    /// Owned copy of the log, oldest first.
    pub fn log_snapshot(&self) -> Vec<LogEntry> {
        self.log.iter().cloned().collect()
    }

    /// How many users are here.
    pub fn user_count(&self) -> usize {
        self.roster.len()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
