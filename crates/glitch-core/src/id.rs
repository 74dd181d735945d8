//! Opaque identifiers for users and messages.
//!
//! Generated identifiers look like `user_1700000000000_k3j9x0q2a`: a prefix,
//! the unix time in milliseconds, and nine random base36 characters. Peers may
//! hand us any non-empty string (`system_1`, `42`, ...); nothing is read out of
//! an identifier beyond equality.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::now_millis;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An opaque, non-empty identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    /// Generate a fresh identifier under `prefix`.
    ///
    /// Uniqueness is probabilistic: no collision check is made.
    pub fn generate(prefix: &str) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{}_{}_{}", prefix, now_millis(), suffix))
    }

    /// Generate a user identifier.
    pub fn user() -> Self {
        Self::generate("user")
    }

    /// Generate a message identifier.
    pub fn message() -> Self {
        Self::generate("msg")
    }

    /// The part before the first `_`, if there is one (e.g., "user", "msg").
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once('_').map(|(prefix, _)| prefix)
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Id {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }
        Ok(Self(s))
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

/// Error parsing an identifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("identifier cannot be empty")]
    Empty,
}
