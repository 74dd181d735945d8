//! Core of the GLITCH matrix chat.
//!
//! A single local user chats in a room whose other side is simulated in
//! process. Actions become [`Envelope`]s, travel over a [`Transport`] (the
//! in-memory [`Loopback`] here) and are applied to the [`SessionState`] by the
//! [`SessionController`], which reports every change to a [`PresentationSink`].

mod controller;
mod envelope;
mod error;
mod id;
mod sink;
mod state;
mod transport;

pub use controller::{MIN_USERNAME_LEN, SessionController, validate_username};
pub use envelope::Envelope;
pub use error::{DuplicateUserError, Field, ProtocolError, SessionError, ValidationError};
pub use id::{Id, IdParseError};
pub use sink::{NullSink, PresentationSink};
pub use state::{LogEntry, Message, SessionState, User};
pub use transport::{EnvelopeHandler, Loopback, Transport};

use std::time::{SystemTime, UNIX_EPOCH};

/// Sliding-window cap on the message log.
pub const MESSAGE_HISTORY_LIMIT: usize = 100;

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Log entries kept before the oldest is evicted.
    pub message_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message_history_limit: MESSAGE_HISTORY_LIMIT,
        }
    }
}

/// Local user's progress through the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Only `join` is allowed.
    Unjoined,
    /// Join envelope in flight.
    Joining,
    /// Only `send_message` is allowed. Terminal.
    Joined,
}

/// Unix time in milliseconds. A clock before the epoch reads as zero.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
