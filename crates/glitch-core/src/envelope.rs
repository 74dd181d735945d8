//! Wire envelopes.
//!
//! Every simulated wire event is one JSON object tagged by `type`:
//!
//! ```json
//! {"type":"join","username":"neo","userId":"user_1700000000000_k3j9x0q2a"}
//! {"type":"message","messageId":"msg_…","userId":"user_…","username":"neo","text":"hi"}
//! ```

use crate::Id;
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// One simulated wire event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// A user entered the room.
    #[serde(rename = "join", rename_all = "camelCase")]
    Join { username: String, user_id: Id },
    /// A user said something.
    #[serde(rename = "message", rename_all = "camelCase")]
    ChatMessage {
        message_id: Id,
        user_id: Id,
        username: String,
        text: String,
    },
}

impl Envelope {
    /// Serialize to a wire frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a wire frame.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// The `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Join { .. } => "join",
            Envelope::ChatMessage { .. } => "message",
        }
    }
}
