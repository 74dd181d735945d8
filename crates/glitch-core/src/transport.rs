//! Envelope transport.
//!
//! Callers hand the transport an encoded frame together with the handler that
//! consumes inbound envelopes. A network transport would write the frame to its
//! link and feed the handler whatever the peer sends back; [`Loopback`] skips
//! the link and delivers the frame to the handler before returning.

use crate::Envelope;
use crate::error::SessionError;

/// Consumes decoded envelopes.
pub trait EnvelopeHandler {
    fn handle(&mut self, envelope: Envelope) -> Result<(), SessionError>;
}

/// Carries frames between the controller and the envelope handlers.
pub trait Transport {
    fn send(&mut self, frame: &str, handler: &mut dyn EnvelopeHandler)
    -> Result<(), SessionError>;
}

/// Same-thread, in-memory transport. No queue, no delay, no loss.
#[derive(Debug, Default)]
pub struct Loopback {
    delivered: u64,
    dropped: u64,
}

impl Loopback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames handed to the handler.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames discarded because they did not decode.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Transport for Loopback {
    fn send(
        &mut self,
        frame: &str,
        handler: &mut dyn EnvelopeHandler,
    ) -> Result<(), SessionError> {
        let envelope = match Envelope::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.dropped += 1;
                tracing::warn!("Dropping frame: {}", e);
                return Err(e.into());
            }
        };

        tracing::debug!("Loopback delivering {} envelope", envelope.kind());
        self.delivered += 1;
        handler.handle(envelope)
    }
}
