//! Default configuration constants for avatext.
//!
//! Shared by the configuration types and the engine components so the same
//! numbers are never spelled twice.

/// Sample rate of inbound agent audio in Hz.
///
/// The voice backend streams 16 kHz mono PCM, the usual rate for speech.
pub const SAMPLE_RATE: u32 = 16000;

/// Bytes per PCM sample (16-bit signed little-endian).
pub const BYTES_PER_SAMPLE: u32 = 2;

/// Compensation added to every reveal deadline for avatar rendering latency.
///
/// The avatar pipeline shows a mouth shape roughly half a second after the
/// matching audio is handed to it; text revealed earlier runs ahead of the lips.
pub const RENDER_DELAY_MS: u64 = 500;

/// Coalescing window for display refreshes, about one 60 Hz frame.
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Capacity of the command channel feeding the engine task.
pub const CHANNEL_BUFFER: usize = 256;

/// Environment variable overriding `reveal.render_delay_ms`.
pub const ENV_RENDER_DELAY_MS: &str = "AVATEXT_RENDER_DELAY_MS";

/// Environment variable overriding `display.frame_interval_ms`.
pub const ENV_FRAME_INTERVAL_MS: &str = "AVATEXT_FRAME_INTERVAL_MS";

/// Environment variable overriding `reveal.short_ground_truth`.
pub const ENV_SHORT_GROUND_TRUTH: &str = "AVATEXT_SHORT_GROUND_TRUTH";
