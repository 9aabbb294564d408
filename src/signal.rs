//! JSON message protocol for signals arriving from the voice and avatar collaborators.

use crate::transcript::Role;
use serde::{Deserialize, Serialize};

/// Per-character timing for a stretch of agent speech.
///
/// Offsets are relative to the start of the audio the block belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignmentBlock {
    pub chars: Vec<char>,
    pub char_start_times_ms: Vec<i64>,
    /// Carried for completeness; scheduling only uses start times.
    #[serde(default)]
    pub char_durations_ms: Vec<u64>,
}

impl AlignmentBlock {
    /// Builds a block from a string and one start offset per character.
    pub fn from_text(text: &str, char_start_times_ms: Vec<i64>) -> Self {
        Self {
            chars: text.chars().collect(),
            char_start_times_ms,
            char_durations_ms: Vec::new(),
        }
    }
}

/// Conversation mode reported at turn boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The agent started speaking.
    Speaking,
    /// The agent finished and the user may talk.
    Listening,
}

/// Inbound events consumed by the reveal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Base64 PCM16 mono chunk of agent speech.
    Audio { audio_base64: String },
    /// Character timing for agent speech.
    Alignment(AlignmentBlock),
    /// Complete text of an utterance.
    Message { role: Role, text: String },
    /// Turn boundary.
    ModeChange { mode: Mode },
    /// Agent playback was cut off.
    Interrupt,
    /// Connection closed mid-session.
    Disconnect { reason: String },
    /// Backend reported an error mid-session.
    Error { reason: String },
    /// A brand-new session begins.
    Reset,
}

impl Signal {
    /// Serialize signal to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize signal from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Audio { .. } => "audio",
            Signal::Alignment(_) => "alignment",
            Signal::Message { .. } => "message",
            Signal::ModeChange { .. } => "mode_change",
            Signal::Interrupt => "interrupt",
            Signal::Disconnect { .. } => "disconnect",
            Signal::Error { .. } => "error",
            Signal::Reset => "reset",
        }
    }
}
