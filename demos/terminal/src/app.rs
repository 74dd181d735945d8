//! Input loop.

use crate::render::TerminalSink;
use glitch_core::{
    Config, Envelope, Id, Loopback, MESSAGE_HISTORY_LIMIT, SessionController, SessionError,
    SessionPhase,
};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const PEER_JOIN_DELAY: Duration = Duration::from_millis(500);
const WELCOME_DELAY: Duration = Duration::from_millis(1000);
const WELCOME: [&str; 2] = [
    "Welcome to GLITCH - The Matrix Chat",
    "Enter the username to begin",
];

pub struct Options {
    /// Join straight away under this name.
    pub name: Option<String>,
    pub history: Option<usize>,
    /// Run the startup sequence (SYSTEM peer, welcome lines).
    pub demo: bool,
}

type Session = SessionController<Loopback, TerminalSink<std::io::Stdout, std::io::Stderr>>;

pub async fn run(options: Options) -> anyhow::Result<()> {
    let config = Config {
        message_history_limit: options.history.unwrap_or(MESSAGE_HISTORY_LIMIT),
    };
    let mut session: Session =
        SessionController::new(&config, Loopback::new(), TerminalSink::stdio());

    if let Some(name) = options.name.as_deref() {
        handle_line(&mut session, name);
    }

    let peer_join = tokio::time::sleep(PEER_JOIN_DELAY);
    let welcome = tokio::time::sleep(WELCOME_DELAY);
    tokio::pin!(peer_join, welcome);
    let mut peer_pending = options.demo;
    let mut welcome_pending = options.demo;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = &mut peer_join, if peer_pending => {
                peer_pending = false;
                let frame = system_peer_join()?;
                if let Err(e) = session.receive(&frame) {
                    tracing::warn!("SYSTEM peer could not join: {}", e);
                }
            }

            _ = &mut welcome, if welcome_pending => {
                welcome_pending = false;
                for text in WELCOME {
                    session.add_system_message(text);
                }
            }

            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&mut session, &line),
                    None => break,
                }
            }
        }
    }

    let state = session.state();
    tracing::info!(
        "Leaving with {} users and {} log entries",
        state.user_count(),
        state.log_snapshot().len()
    );
    Ok(())
}

/// The frame a simulated `SYSTEM` peer sends when it enters.
fn system_peer_join() -> anyhow::Result<String> {
    let envelope = Envelope::Join {
        username: "SYSTEM".to_string(),
        user_id: "system_1".parse::<Id>()?,
    };
    Ok(envelope.encode()?)
}

/// Before joining a line is a username; afterwards it is a message.
/// Rejected input is already reported by the sink.
fn handle_line<O: Write, E: Write>(
    session: &mut SessionController<Loopback, TerminalSink<O, E>>,
    line: &str,
) {
    let result = match session.phase() {
        SessionPhase::Joined => session.send_message(line).map(|_| ()),
        SessionPhase::Unjoined | SessionPhase::Joining => session.join(line).map(|_| ()),
    };

    match result {
        Ok(()) | Err(SessionError::Validation(_)) => {}
        Err(e) => tracing::warn!("{}", e),
    }
}
