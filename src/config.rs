//! TOML configuration with environment variable overrides.

use crate::defaults;
use crate::error::{AvatextError, Result};
use crate::reconcile::ShortGroundTruthPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub reveal: RevealConfig,
    pub audio: AudioConfig,
    pub display: DisplayConfig,
}

/// Reveal timing and reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    /// Added to every reveal deadline to match avatar rendering latency.
    pub render_delay_ms: u64,
    /// What finalize writes when ground truth is shorter than the revealed text.
    pub short_ground_truth: ShortGroundTruthPolicy,
}

/// Format of the inbound agent audio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub bytes_per_sample: u32,
}

/// Display refresh coalescing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub frame_interval_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            render_delay_ms: defaults::RENDER_DELAY_MS,
            short_ground_truth: ShortGroundTruthPolicy::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            bytes_per_sample: defaults::BYTES_PER_SAMPLE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: defaults::FRAME_INTERVAL_MS,
        }
    }
}

impl RevealConfig {
    pub fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AvatextError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AvatextError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(AvatextError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(AvatextError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.bytes_per_sample == 0 {
            return Err(AvatextError::ConfigInvalidValue {
                key: "audio.bytes_per_sample".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - AVATEXT_RENDER_DELAY_MS → reveal.render_delay_ms
    /// - AVATEXT_FRAME_INTERVAL_MS → display.frame_interval_ms
    /// - AVATEXT_SHORT_GROUND_TRUTH → reveal.short_ground_truth
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env_u64(defaults::ENV_RENDER_DELAY_MS) {
            self.reveal.render_delay_ms = ms;
        }

        if let Some(ms) = env_u64(defaults::ENV_FRAME_INTERVAL_MS) {
            self.display.frame_interval_ms = ms;
        }

        if let Ok(value) = std::env::var(defaults::ENV_SHORT_GROUND_TRUTH)
            && !value.is_empty()
        {
            match ShortGroundTruthPolicy::parse(&value) {
                Some(policy) => self.reveal.short_ground_truth = policy,
                None => tracing::warn!(
                    var = defaults::ENV_SHORT_GROUND_TRUTH,
                    value = %value,
                    "ignoring unknown short ground truth policy"
                ),
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/avatext/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("avatext").join("config.toml"))
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AvatextError::ConfigParse {
            message: e.to_string(),
        })
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match value.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(var = key, value = %value, error = %e, "ignoring invalid override");
            None
        }
    }
}
