//! Link configuration

use std::time::Duration;

use crate::encoding::ChipPolicy;
use crate::error::{LinkError, Result};
use crate::wire::{DEFAULT_BIT_RATE, FRAME_BITS, MAX_BIT_RATE};

/// Settings shared by both ends of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Ticks (channel bits) per second
    pub bit_rate: u32,
    /// How the receiver treats invalid chip pairs
    pub chip_policy: ChipPolicy,
    /// Abandon a capture as soon as a sentinel bit is wrong
    pub resync_on_sentinel_error: bool,
}

impl LinkConfig {
    /// Time between two ticks
    ///
    /// Out-of-range rates are clamped, so the period is never zero.
    pub fn tick_period(&self) -> Duration {
        let rate = self.bit_rate.clamp(1, MAX_BIT_RATE);
        Duration::from_nanos(1_000_000_000 / u64::from(rate))
    }

    /// Payload bytes per second at full utilization
    pub fn byte_rate(&self) -> f64 {
        f64::from(self.bit_rate) / FRAME_BITS as f64
    }

    /// Check the settings
    pub fn validate(&self) -> Result<()> {
        if self.bit_rate == 0 {
            return Err(LinkError::invalid_config("bit rate must be non-zero"));
        }
        if self.bit_rate > MAX_BIT_RATE {
            return Err(LinkError::invalid_config(format!(
                "bit rate {} exceeds {}",
                self.bit_rate, MAX_BIT_RATE
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl LinkConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let config: LinkConfig =
            serde_json::from_str(text).map_err(|e| LinkError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            bit_rate: DEFAULT_BIT_RATE,
            chip_policy: ChipPolicy::default(),
            resync_on_sentinel_error: true,
        }
    }
}

/// Builder for [`LinkConfig`]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a builder starting from the defaults
    pub fn new() -> Self {
        LinkConfigBuilder {
            config: LinkConfig::default(),
        }
    }

    /// Set the bit rate
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.config.bit_rate = bit_rate;
        self
    }

    /// Set the invalid-chip policy
    pub fn with_chip_policy(mut self, policy: ChipPolicy) -> Self {
        self.config.chip_policy = policy;
        self
    }

    /// Enable or disable early resynchronization on a bad sentinel bit
    pub fn with_resync_on_sentinel_error(mut self, enabled: bool) -> Self {
        self.config.resync_on_sentinel_error = enabled;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<LinkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for LinkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
