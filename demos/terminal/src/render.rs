//! Terminal presentation sink.

use glitch_core::{Field, Message, PresentationSink, User};
use std::io::Write;

/// Writes chat to one stream and input complaints to another.
pub struct TerminalSink<O, E> {
    out: O,
    err: E,
}

impl TerminalSink<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    // A broken terminal isn't worth tearing the session down for.
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::debug!("stdout write failed: {}", e);
        }
    }

    fn notice(&mut self, text: &str) {
        if let Err(e) = writeln!(self.err, "{text}") {
            tracing::debug!("stderr write failed: {}", e);
        }
    }

    #[cfg(test)]
    pub(crate) fn buffers(&self) -> (&O, &E) {
        (&self.out, &self.err)
    }
}

impl<O: Write, E: Write> PresentationSink for TerminalSink<O, E> {
    fn on_roster_changed(&mut self, roster: &[User]) {
        self.line(format_args!("Users: {}", roster.len()));
        for user in roster {
            self.line(format_args!("  * {}", user.display_name));
        }
    }

    fn on_message_appended(&mut self, message: &Message) {
        self.line(format_args!(
            "[ {} ] {}  {}",
            message.author_name,
            message.text,
            clock(message.timestamp)
        ));
    }

    fn on_system_message(&mut self, text: &str) {
        self.line(format_args!(">>> {text}"));
    }

    fn on_validation_failed(&mut self, field: Field) {
        let what = match field {
            Field::Username => "username",
            Field::Text => "message",
        };
        self.notice(&format!("~ g l i t c h ~ {what} rejected"));
    }
}

/// `HH:MM:SS` (UTC) for a unix-millisecond timestamp.
fn clock(millis: u64) -> String {
    let secs = (millis / 1000) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
