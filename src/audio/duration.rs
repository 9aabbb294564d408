//! Audio duration accounting for base64-encoded PCM payloads.
//!
//! The engine only needs to know how much speech a chunk carries, never the
//! samples themselves, so the byte count is derived from the encoded length.

use crate::config::AudioConfig;

/// Converts encoded audio payloads into elapsed milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationAccountant {
    sample_rate: u32,
    bytes_per_sample: u32,
}

impl DurationAccountant {
    /// Creates an accountant for the given PCM format.
    ///
    /// Zero values are treated as 1 so the arithmetic stays finite; configs
    /// reject them earlier through `Config::validate`.
    pub fn new(sample_rate: u32, bytes_per_sample: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            bytes_per_sample: bytes_per_sample.max(1),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.sample_rate, config.bytes_per_sample)
    }

    /// Number of raw bytes encoded by a base64 payload.
    ///
    /// `floor(len * 3 / 4) - padding`, where padding is 2 for a trailing `==`,
    /// 1 for a trailing `=`, and 0 otherwise. Never underflows.
    pub fn payload_bytes(payload: &str) -> usize {
        let encoded = payload.len().saturating_mul(3) / 4;
        encoded.saturating_sub(trailing_padding(payload))
    }

    /// Playback duration of a base64 payload in milliseconds.
    pub fn duration_ms(&self, payload: &str) -> f64 {
        let bytes = Self::payload_bytes(payload) as f64;
        bytes / f64::from(self.bytes_per_sample) / f64::from(self.sample_rate) * 1000.0
    }
}

impl Default for DurationAccountant {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

fn trailing_padding(payload: &str) -> usize {
    if payload.ends_with("==") {
        2
    } else if payload.ends_with('=') {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_second_of_pcm16_mono_16k() {
        let payload = STANDARD.encode(vec![0u8; 32_000]);
        let accountant = DurationAccountant::default();
        assert_eq!(DurationAccountant::payload_bytes(&payload), 32_000);
        assert!(approx_eq(accountant.duration_ms(&payload), 1000.0));
    }

    #[test]
    fn padding_is_subtracted() {
        // 1 byte → "AA==", 2 bytes → "AAA="
        assert_eq!(DurationAccountant::payload_bytes("AA=="), 1);
        assert_eq!(DurationAccountant::payload_bytes("AAA="), 2);
        assert_eq!(DurationAccountant::payload_bytes("AAAA"), 3);

        for len in 0..64usize {
            let payload = STANDARD.encode(vec![7u8; len]);
            assert_eq!(
                DurationAccountant::payload_bytes(&payload),
                len,
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn matches_closed_form() {
        // L = 8, P = 2 → ((8*3/4 - 2) / 2 / 16000) * 1000 = 0.125 ms
        let accountant = DurationAccountant::default();
        assert!(approx_eq(accountant.duration_ms("AAAAAA=="), 0.125));
    }

    #[test]
    fn missing_padding_counts_as_zero() {
        // Unpadded "AA" would be 1 byte when decoded; the estimate is floor(2*3/4) = 1.
        assert_eq!(DurationAccountant::payload_bytes("AA"), 1);
    }

    #[test]
    fn degenerate_payloads_never_go_negative() {
        let accountant = DurationAccountant::default();
        for payload in ["", "=", "==", "===", "A=", "A=="] {
            let ms = accountant.duration_ms(payload);
            assert!(ms >= 0.0, "{payload:?} produced {ms}");
        }
        assert_eq!(accountant.duration_ms("=="), 0.0);
    }

    #[test]
    fn respects_configured_format() {
        let accountant = DurationAccountant::new(24_000, 2);
        let payload = STANDARD.encode(vec![0u8; 48_000]);
        assert!(approx_eq(accountant.duration_ms(&payload), 1000.0));
    }

    #[test]
    fn zero_format_values_do_not_divide_by_zero() {
        let accountant = DurationAccountant::new(0, 0);
        assert!(accountant.duration_ms("AAAA").is_finite());
    }
}
