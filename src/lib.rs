//! avatext - Speech-synchronized transcript reveal
//!
//! Reveals an agent's reply character by character in step with its audio
//! playback, reconciles the revealed text with the authoritative message, and
//! keeps a transcript that survives interruptions and disconnects.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod display;
pub mod engine;
pub mod error;
#[cfg(feature = "cli")]
pub mod output;
pub mod reconcile;
pub mod replay;
pub mod reveal;
pub mod runtime;
pub mod signal;
pub mod sink;
pub mod transcript;

// Engine
pub use engine::{RevealEngine, TurnPhase};
pub use runtime::{EngineCommand, EngineHandle, spawn_engine};

// Components
pub use audio::DurationAccountant;
pub use reconcile::{MessageReconciler, ShortGroundTruthPolicy};
pub use reveal::{RevealScheduler, RevealState, SpeechTurn};

// Data
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::DisplayUpdate;
pub use signal::{AlignmentBlock, Mode, Signal};
pub use transcript::{Message, Role};

// Output
pub use sink::{CollectorSink, TranscriptSink};
#[cfg(feature = "cli")]
pub use sink::{StdoutFormat, StdoutSink};

// Error handling
pub use error::{AvatextError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
