//! Terminal rendering of transcript updates.
//! Used by `avatext replay` and by [`crate::sink::StdoutSink`].

use crate::display::DisplayUpdate;
use crate::transcript::{Message, Role};
use owo_colors::OwoColorize;

/// Marker appended to messages whose playback was cut off.
pub const INTERRUPTED_MARKER: &str = "[interrupted]";

/// Format one message as a single line.
pub fn format_message(message: &Message, color: bool) -> String {
    let label = match message.role {
        Role::User => "user ",
        Role::Agent => "agent",
    };

    if !color {
        return if message.interrupted {
            format!("{label}: {} {INTERRUPTED_MARKER}", message.text)
        } else {
            format!("{label}: {}", message.text)
        };
    }

    let label = match message.role {
        Role::User => label.cyan().to_string(),
        Role::Agent => label.green().to_string(),
    };
    if message.interrupted {
        format!(
            "{label}: {} {}",
            message.text.dimmed(),
            INTERRUPTED_MARKER.yellow()
        )
    } else {
        format!("{label}: {}", message.text)
    }
}

/// Lines for the messages that differ from `previous`, prefixed with their index.
pub fn changed_lines(previous: &[Message], update: &DisplayUpdate, color: bool) -> Vec<String> {
    let mut lines: Vec<String> = update
        .messages
        .iter()
        .enumerate()
        .filter(|(i, message)| previous.get(*i) != Some(*message))
        .map(|(i, message)| format!("#{i} {}", format_message(message, color)))
        .collect();

    if update.messages.len() < previous.len() {
        lines.insert(0, "(transcript cleared)".to_string());
    }
    lines
}

/// Format a whole transcript, one message per line.
pub fn format_transcript(messages: &[Message], color: bool) -> String {
    messages
        .iter()
        .map(|m| format_message(m, color))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(messages: Vec<Message>) -> DisplayUpdate {
        DisplayUpdate {
            revision: 1,
            messages,
        }
    }

    #[test]
    fn plain_format_marks_interruption() {
        let mut message = Message::agent("Hel");
        assert_eq!(format_message(&message, false), "agent: Hel");
        message.interrupted = true;
        assert_eq!(format_message(&message, false), "agent: Hel [interrupted]");
        assert_eq!(format_message(&Message::user("hi"), false), "user : hi");
    }

    #[test]
    fn colored_format_keeps_text() {
        let line = format_message(&Message::agent("Hello"), true);
        assert!(line.contains("Hello"));
        assert!(line.contains("\x1b["));
    }

    #[test]
    fn only_changed_messages_are_listed() {
        let previous = vec![Message::user("hi"), Message::agent("He")];
        let next = update(vec![
            Message::user("hi"),
            Message::agent("Hello"),
            Message::user("ok"),
        ]);

        assert_eq!(
            changed_lines(&previous, &next, false),
            ["#1 agent: Hello", "#2 user : ok"]
        );
    }

    #[test]
    fn shrinking_transcript_reports_clear() {
        let previous = vec![Message::user("hi")];
        assert_eq!(
            changed_lines(&previous, &update(Vec::new()), false),
            ["(transcript cleared)"]
        );
    }

    #[test]
    fn transcript_joins_lines() {
        let messages = [Message::user("a"), Message::agent("b")];
        assert_eq!(format_transcript(&messages, false), "user : a\nagent: b");
    }
}
