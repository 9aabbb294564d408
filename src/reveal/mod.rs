//! Per-character reveal timing.
//!
//! ```text
//!  alignment block ──▶ RevealScheduler ──(deadline heap)──▶ RevealState.advance_to
//!        │                  ▲                                     │
//!        │                  │ stamped audio offset                ▼
//!        └──▶ aligned text  └── SpeechTurn.cumulative_audio_ms   revealed_index
//! ```

pub mod scheduler;
pub mod state;

pub use scheduler::{BlockSchedule, RevealEvent, RevealScheduler};
pub use state::{RevealState, SpeechTurn, TurnId};
