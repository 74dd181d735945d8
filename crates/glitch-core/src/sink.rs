//! Presentation sink: where state changes are rendered.

use crate::error::Field;
use crate::state::{Message, User};

/// Receives state-change notifications. Owns no chat state.
pub trait PresentationSink {
    /// The roster changed; `roster` is the full list in join order.
    fn on_roster_changed(&mut self, roster: &[User]);

    /// A chat message was added to the log.
    fn on_message_appended(&mut self, message: &Message);

    /// An informational line was added to the log.
    fn on_system_message(&mut self, text: &str);

    /// Input was rejected. Cosmetic feedback only.
    fn on_validation_failed(&mut self, field: Field);
}

/// A sink that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_roster_changed(&mut self, _roster: &[User]) {}
    fn on_message_appended(&mut self, _message: &Message) {}
    fn on_system_message(&mut self, _text: &str) {}
    fn on_validation_failed(&mut self, _field: Field) {}
}
