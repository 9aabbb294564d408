//! Consumers of display updates.

use crate::display::DisplayUpdate;
use crate::error::Result;
#[cfg(feature = "cli")]
use crate::transcript::Message;
use std::sync::{Arc, Mutex, PoisonError};

/// Pluggable output for transcript refreshes.
/// The rendering layer implements this to receive every coalesced update.
pub trait TranscriptSink: Send + 'static {
    /// Handle one refresh. Called once per emitted update, in revision order.
    fn handle(&mut self, update: &DisplayUpdate) -> Result<()>;

    /// Called once when the engine shuts down, after the last update.
    fn finish(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Keeps every update. Clones share storage, so a test can hand one clone to
/// the engine task and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    updates: Arc<Mutex<Vec<DisplayUpdate>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<DisplayUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest(&self) -> Option<DisplayUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl TranscriptSink for CollectorSink {
    fn handle(&mut self, update: &DisplayUpdate) -> Result<()> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Output style for [`StdoutSink`].
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutFormat {
    /// Changed messages as readable lines.
    Text { color: bool },
    /// Every update as one JSON object per line.
    Json,
}

/// Prints updates to stdout.
#[cfg(feature = "cli")]
pub struct StdoutSink {
    format: StdoutFormat,
    previous: Vec<Message>,
}

#[cfg(feature = "cli")]
impl StdoutSink {
    pub fn new(format: StdoutFormat) -> Self {
        Self {
            format,
            previous: Vec::new(),
        }
    }

    /// Lines this sink would print for `update`, advancing its state.
    pub fn render(&mut self, update: &DisplayUpdate) -> Result<Vec<String>> {
        let lines = match self.format {
            StdoutFormat::Text { color } => {
                crate::output::changed_lines(&self.previous, update, color)
            }
            StdoutFormat::Json => vec![serde_json::to_string(update)?],
        };
        self.previous.clone_from(&update.messages);
        Ok(lines)
    }
}

#[cfg(feature = "cli")]
impl TranscriptSink for StdoutSink {
    fn handle(&mut self, update: &DisplayUpdate) -> Result<()> {
        use std::io::Write;

        let mut out = std::io::stdout().lock();
        for line in self.render(update)? {
            writeln!(out, "{line}").map_err(|e| crate::error::AvatextError::Sink {
                sink: self.name().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        use std::io::Write;

        if let Err(e) = std::io::stdout().lock().flush() {
            tracing::warn!(error = %e, "stdout flush failed");
        }
        self.previous.clear();
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
