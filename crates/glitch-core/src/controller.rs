//! Session controller: the join and send use cases.
//!
//! The controller is the only writer of [`SessionState`]. Local actions are
//! validated here, wrapped in an [`Envelope`] and pushed through the
//! [`Transport`]; the envelope handlers below apply them to the state and
//! notify the [`PresentationSink`].

use crate::error::{SessionError, ValidationError};
use crate::sink::PresentationSink;
use crate::state::{Message, SessionState, User};
use crate::transport::{EnvelopeHandler, Loopback, Transport};
use crate::{Config, Envelope, Id, SessionPhase, now_millis};

/// Shortest accepted username, in characters, after trimming.
pub const MIN_USERNAME_LEN: usize = 2;

/// Drives one local user's session.
pub struct SessionController<T, S> {
    state: SessionState,
    transport: T,
    sink: S,
    phase: SessionPhase,
    identity: Option<User>,
}

impl<S: PresentationSink> SessionController<Loopback, S> {
    /// A session over the in-memory loopback with default settings.
    pub fn loopback(sink: S) -> Self {
        Self::new(&Config::default(), Loopback::new(), sink)
    }
}

impl<T: Transport, S: PresentationSink> SessionController<T, S> {
    /// A session that has not joined yet.
    pub fn new(config: &Config, transport: T, sink: S) -> Self {
        Self {
            state: SessionState::new(config),
            transport,
            sink,
            phase: SessionPhase::Unjoined,
            identity: None,
        }
    }

    /// Enter the room as `username`.
    ///
    /// Either completes fully (phase `Joined`, user in the roster, join line in
    /// the log) or fails without touching anything.
    pub fn join(&mut self, username: &str) -> Result<&User, SessionError> {
        if self.phase != SessionPhase::Unjoined {
            tracing::warn!("Ignoring join while {:?}", self.phase);
            return Err(SessionError::AlreadyJoined);
        }

        let username = match validate_username(username) {
            Ok(name) => name.to_string(),
            Err(e) => {
                self.sink.on_validation_failed(e.field());
                return Err(e.into());
            }
        };

        let user_id = Id::user();
        self.phase = SessionPhase::Joining;
        tracing::debug!("Joining as {} ({})", username, user_id);

        let envelope = Envelope::Join {
            username,
            user_id: user_id.clone(),
        };
        if let Err(e) = self.dispatch(&envelope) {
            self.phase = SessionPhase::Unjoined;
            return Err(e);
        }

        let Some(user) = self.state.user(&user_id).cloned() else {
            tracing::warn!("Join for {} never reached the roster", user_id);
            self.phase = SessionPhase::Unjoined;
            return Err(SessionError::JoinNotDelivered(user_id));
        };
        self.phase = SessionPhase::Joined;
        tracing::info!("{} joined", user.display_name);
        Ok(&*self.identity.insert(user))
    }

    /// Say `text` to the room. Returns the new message's id.
    pub fn send_message(&mut self, text: &str) -> Result<Id, SessionError> {
        let identity = match (&self.phase, &self.identity) {
            (SessionPhase::Joined, Some(identity)) => identity,
            _ => return Err(SessionError::NotJoined(self.phase)),
        };

        let text = text.trim();
        if text.is_empty() {
            let e = ValidationError::EmptyText;
            self.sink.on_validation_failed(e.field());
            return Err(e.into());
        }

        let message_id = Id::message();
        let envelope = Envelope::ChatMessage {
            message_id: message_id.clone(),
            user_id: identity.id.clone(),
            username: identity.display_name.clone(),
            text: text.to_string(),
        };
        self.dispatch(&envelope)?;
        Ok(message_id)
    }

    /// Add an informational line. Local only; never goes over the transport.
    pub fn add_system_message(&mut self, text: &str) {
        self.state.append_system(text);
        self.sink.on_system_message(text);
    }

    /// Accept a frame sent by a simulated peer.
    pub fn receive(&mut self, frame: &str) -> Result<(), SessionError> {
        let mut handlers = Handlers {
            state: &mut self.state,
            sink: &mut self.sink,
        };
        self.transport.send(frame, &mut handlers)
    }

    fn dispatch(&mut self, envelope: &Envelope) -> Result<(), SessionError> {
        let frame = envelope.encode()?;
        self.receive(&frame)
    }

    /// Where the local user is in the join flow.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The local user, once joined.
    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    /// Roster and log, read-only.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The transport frames travel over.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Where changes are reported.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Trim and check a username.
pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    let name = username.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if name.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort {
            min: MIN_USERNAME_LEN,
        });
    }
    Ok(name)
}

/// Applies delivered envelopes to the state.
struct Handlers<'a, S> {
    state: &'a mut SessionState,
    sink: &'a mut S,
}

impl<S: PresentationSink> EnvelopeHandler for Handlers<'_, S> {
    fn handle(&mut self, envelope: Envelope) -> Result<(), SessionError> {
        match envelope {
            Envelope::Join { username, user_id } => {
                if let Err(e) = self.state.add_user(User::new(user_id, username.clone())) {
                    tracing::warn!("Rejected join: {}", e);
                    return Err(e.into());
                }
                self.sink.on_roster_changed(self.state.roster());

                let text = format!("{username} joined the matrix");
                self.state.append_system(text.as_str());
                self.sink.on_system_message(&text);
            }

            Envelope::ChatMessage {
                message_id,
                user_id,
                username,
                text,
            } => {
                let message = Message {
                    id: message_id,
                    author_id: user_id,
                    author_name: username,
                    text,
                    timestamp: now_millis(),
                };
                if let Some(evicted) = self.state.append_message(message.clone()) {
                    tracing::trace!("Evicted oldest log entry: {:?}", evicted);
                }
                self.sink.on_message_appended(&message);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MESSAGE_HISTORY_LIMIT;
    use crate::error::Field;
    use crate::state::LogEntry;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Roster(Vec<String>),
        Message(String, String),
        System(String),
        Invalid(Field),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl PresentationSink for Recorder {
        fn on_roster_changed(&mut self, roster: &[User]) {
            let names = roster.iter().map(|u| u.display_name.clone()).collect();
            self.0.push(Event::Roster(names));
        }

        fn on_message_appended(&mut self, message: &Message) {
            self.0
                .push(Event::Message(message.author_name.clone(), message.text.clone()));
        }

        fn on_system_message(&mut self, text: &str) {
            self.0.push(Event::System(text.to_string()));
        }

        fn on_validation_failed(&mut self, field: Field) {
            self.0.push(Event::Invalid(field));
        }
    }

    fn session() -> SessionController<Loopback, Recorder> {
        SessionController::loopback(Recorder::default())
    }

    /// Fails every frame without delivering it.
    struct Refuse;

    impl Transport for Refuse {
        fn send(
            &mut self,
            _frame: &str,
            _handler: &mut dyn EnvelopeHandler,
        ) -> Result<(), SessionError> {
            Err(Envelope::decode("").unwrap_err().into())
        }
    }

    /// Accepts every frame and never delivers it.
    struct Swallow;

    impl Transport for Swallow {
        fn send(
            &mut self,
            _frame: &str,
            _handler: &mut dyn EnvelopeHandler,
        ) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[test]
    fn failed_dispatch_rolls_join_back() {
        let mut s = SessionController::new(&Config::default(), Refuse, Recorder::default());

        let err = s.join("neo").unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
        assert_eq!(s.phase(), SessionPhase::Unjoined);
        assert!(s.identity().is_none());
        assert_eq!(s.state().user_count(), 0);
        assert!(s.state().log_snapshot().is_empty());
        assert!(s.sink().0.is_empty());
    }

    #[test]
    fn undelivered_join_is_an_error() {
        let mut s = SessionController::new(&Config::default(), Swallow, Recorder::default());

        let err = s.join("neo").unwrap_err();
        assert!(matches!(err, SessionError::JoinNotDelivered(_)));
        assert_eq!(s.phase(), SessionPhase::Unjoined);
        assert!(s.identity().is_none());
        assert_eq!(s.state().user_count(), 0);
        assert!(s.sink().0.is_empty());
    }

    #[test]
    fn peer_message_with_opaque_ids() {
        let mut s = session();
        s.receive(r#"{"type":"message","messageId":"m1","userId":"u1","username":"peer","text":"hi"}"#)
            .unwrap();

        let log = s.state().log_snapshot();
        assert_eq!(log.len(), 1);
        let message = log[0].as_message().unwrap();
        assert_eq!(message.id.as_str(), "m1");
        assert_eq!(message.author_id.as_str(), "u1");
        assert_eq!(message.text, "hi");
        assert_eq!(s.sink().0, vec![Event::Message("peer".into(), "hi".into())]);
    }

    #[test]
    fn join_then_send() {
        let mut s = session();
        s.join("Bob").unwrap();

        let roster = s.state().roster_snapshot();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].display_name, "Bob");
        let log = s.state().log_snapshot();
        assert_eq!(log.len(), 1);
        assert!(log[0].is_system());
        assert_eq!(log[0].text(), "Bob joined the matrix");

        s.send_message("hello").unwrap();
        let log = s.state().log_snapshot();
        assert_eq!(log.len(), 2);
        let second = log[1].as_message().unwrap();
        assert_eq!(second.text, "hello");
        assert_eq!(second.author_name, "Bob");

        assert_eq!(
            s.sink().0,
            vec![
                Event::Roster(vec!["Bob".into()]),
                Event::System("Bob joined the matrix".into()),
                Event::Message("Bob".into(), "hello".into()),
            ]
        );
    }

    #[test]
    fn join_sets_identity_once() {
        let mut s = session();
        assert_eq!(s.phase(), SessionPhase::Unjoined);
        assert!(s.identity().is_none());

        let id = s.join("Alice").unwrap().id.clone();
        assert_eq!(s.phase(), SessionPhase::Joined);
        assert_eq!(s.identity().unwrap().display_name, "Alice");

        let err = s.join("Mallory").unwrap_err();
        assert!(matches!(err, SessionError::AlreadyJoined));
        let identity = s.identity().unwrap();
        assert_eq!(identity.display_name, "Alice");
        assert_eq!(identity.id, id);
        assert_eq!(s.state().user_count(), 1);
    }

    #[test]
    fn username_length_boundary() {
        for bad in ["", " ", "A", "  A  "] {
            let mut s = session();
            let err = s.join(bad).unwrap_err();
            assert!(
                matches!(err, SessionError::Validation(_)),
                "{bad:?} gave {err:?}"
            );
            assert_eq!(s.phase(), SessionPhase::Unjoined);
            assert_eq!(s.state().user_count(), 0);
            assert!(s.state().log_snapshot().is_empty());
            assert_eq!(s.sink().0, vec![Event::Invalid(Field::Username)]);
        }

        let mut s = session();
        assert_eq!(s.join("Al").unwrap().display_name, "Al");
    }

    #[test]
    fn username_is_trimmed() {
        let mut s = session();
        s.join("  neo \n").unwrap();
        assert_eq!(s.identity().unwrap().display_name, "neo");
    }

    #[test]
    fn sent_message_is_authored_by_identity() {
        let mut s = session();
        s.join("Alice").unwrap();
        let before = s.state().log_snapshot().len();

        let message_id = s.send_message("hi").unwrap();

        let log = s.state().log_snapshot();
        assert_eq!(log.len(), before + 1);
        let message = log.last().and_then(LogEntry::as_message).unwrap();
        assert_eq!(message.id, message_id);
        assert_eq!(message.text, "hi");
        assert_eq!(message.author_id, s.identity().unwrap().id);
        assert_eq!(s.transport().delivered(), 2);
    }

    #[test]
    fn send_requires_join() {
        let mut s = session();
        let err = s.send_message("hello?").unwrap_err();
        assert!(matches!(err, SessionError::NotJoined(SessionPhase::Unjoined)));
        assert!(s.state().log_snapshot().is_empty());
        assert_eq!(s.transport().delivered(), 0);
    }

    #[test]
    fn blank_message_rejected() {
        let mut s = session();
        s.join("Alice").unwrap();
        let before = s.state().log_snapshot();

        let err = s.send_message("   ").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::EmptyText)
        ));
        assert_eq!(s.state().log_snapshot(), before);
        assert_eq!(s.sink().0.last(), Some(&Event::Invalid(Field::Text)));
        assert_eq!(s.transport().delivered(), 1);
    }

    #[test]
    fn system_message_bypasses_transport() {
        let mut s = session();
        s.add_system_message("Welcome to GLITCH - The Matrix Chat");

        assert_eq!(s.transport().delivered(), 0);
        let log = s.state().log_snapshot();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text(), "Welcome to GLITCH - The Matrix Chat");
        assert_eq!(
            s.sink().0,
            vec![Event::System("Welcome to GLITCH - The Matrix Chat".into())]
        );
    }

    #[test]
    fn peer_join_leaves_phase_alone() {
        let mut s = session();
        s.receive(r#"{"type":"join","username":"SYSTEM","userId":"system_1"}"#)
            .unwrap();

        assert_eq!(s.phase(), SessionPhase::Unjoined);
        assert!(s.identity().is_none());
        assert_eq!(s.state().user_count(), 1);
        assert_eq!(s.state().log_snapshot()[0].text(), "SYSTEM joined the matrix");

        s.join("neo").unwrap();
        let names: Vec<String> = s
            .state()
            .roster_snapshot()
            .into_iter()
            .map(|u| u.display_name)
            .collect();
        assert_eq!(names, ["SYSTEM", "neo"]);
    }

    #[test]
    fn malformed_frame_changes_nothing() {
        let mut s = session();
        s.join("neo").unwrap();
        let log = s.state().log_snapshot();
        let events = s.sink().0.len();

        for frame in ["{", r#"{"type":"leave","userId":"user_1_a"}"#] {
            let err = s.receive(frame).unwrap_err();
            assert!(matches!(err, SessionError::Protocol(_)));
        }

        assert_eq!(s.state().log_snapshot(), log);
        assert_eq!(s.state().user_count(), 1);
        assert_eq!(s.sink().0.len(), events);
        assert_eq!(s.transport().dropped(), 2);
    }

    #[test]
    fn duplicate_peer_join_rejected() {
        let mut s = session();
        let frame = r#"{"type":"join","username":"SYSTEM","userId":"system_1"}"#;
        s.receive(frame).unwrap();

        let err = s.receive(frame).unwrap_err();
        assert!(matches!(err, SessionError::DuplicateUser(_)));
        assert_eq!(s.state().user_count(), 1);
        assert_eq!(s.state().log_snapshot().len(), 1);
    }

    #[test]
    fn chatter_stays_within_history() {
        let mut s = session();
        s.join("neo").unwrap();
        for n in 0..(MESSAGE_HISTORY_LIMIT * 2) {
            s.send_message(&format!("line {n}")).unwrap();
            assert!(s.state().log_snapshot().len() <= MESSAGE_HISTORY_LIMIT);
        }

        let log = s.state().log_snapshot();
        assert!(log.iter().all(|e| !e.is_system()));
        assert_eq!(log[0].text(), format!("line {}", MESSAGE_HISTORY_LIMIT));
    }
}
