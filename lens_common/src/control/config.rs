//! Configuration of the lens control core.
//!
//! All sections derive `serde::Deserialize` for TOML loading and default
//! individually, so an empty file yields the built-in configuration.
//! `LensConfig::validate` rejects values the core cannot run with.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_SAMPLE_PERIOD_US, DEFAULT_SETTLE_MS, DEFAULT_STATUS_LANE, DEFAULT_TX_POLL_LIMIT,
    FOCUS_DIVIDER, FOCUS_MAX, SAMPLE_MASK, TX_LANES,
};
use crate::control::types::Scaling;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level control core configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "lens-core"
///
/// [focus]
/// max_target = 255
///
/// [sequencer]
/// settle_ms = 1000
/// settle_policy = "queue"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LensConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
}

impl LensConfig {
    /// Validate every section.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` not empty
    /// 2. `focus.divider` > 0, `focus.sample_mask` != 0
    /// 3. `focus.max_target` <= FOCUS_MAX
    /// 4. `sampler.period_us` > 0
    /// 5. `bus.status_lane` < TX_LANES, `bus.tx_poll_limit` > 0
    /// 6. `sequencer.settle_ms` > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.focus.validate()?;

        if self.sampler.period_us == 0 {
            return Err(ConfigError::invalid("sampler.period_us must be greater than 0"));
        }

        if self.bus.status_lane >= TX_LANES {
            return Err(ConfigError::invalid(format!(
                "bus.status_lane {} out of range [0, {})",
                self.bus.status_lane, TX_LANES
            )));
        }
        if self.bus.tx_poll_limit == 0 {
            return Err(ConfigError::invalid("bus.tx_poll_limit must be greater than 0"));
        }

        if self.sequencer.settle_ms == 0 {
            return Err(ConfigError::invalid("sequencer.settle_ms must be greater than 0"));
        }
        Ok(())
    }
}

// ─── Focus ──────────────────────────────────────────────────────────

fn default_max_target() -> u32 {
    FOCUS_MAX
}
fn default_divider() -> u32 {
    FOCUS_DIVIDER
}
fn default_sample_mask() -> u32 {
    SAMPLE_MASK
}

/// Focus axis limits and sample scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Largest accepted focus target [scaled units] (default: 255).
    #[serde(default = "default_max_target")]
    pub max_target: u32,

    /// Divider from masked raw counts to scaled units (default: 100).
    #[serde(default = "default_divider")]
    pub divider: u32,

    /// Significant bits of a raw sample (default: 0x0FFF).
    #[serde(default = "default_sample_mask")]
    pub sample_mask: u32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            max_target: FOCUS_MAX,
            divider: FOCUS_DIVIDER,
            sample_mask: SAMPLE_MASK,
        }
    }
}

impl FocusConfig {
    /// Scaling applied to raw position samples.
    #[inline]
    pub const fn scaling(&self) -> Scaling {
        Scaling::new(self.sample_mask, self.divider)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.divider == 0 {
            return Err(ConfigError::invalid("focus.divider must be greater than 0"));
        }
        if self.sample_mask == 0 {
            return Err(ConfigError::invalid("focus.sample_mask cannot be empty"));
        }
        if self.max_target > FOCUS_MAX {
            return Err(ConfigError::invalid(format!(
                "focus.max_target {} exceeds the 8-bit command field (max {})",
                self.max_target, FOCUS_MAX
            )));
        }
        Ok(())
    }
}

// ─── Sampler ────────────────────────────────────────────────────────

fn default_period_us() -> u32 {
    DEFAULT_SAMPLE_PERIOD_US
}

/// Acquisition trigger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Trigger period in microseconds (default: 1000 = 1 kHz).
    #[serde(default = "default_period_us")]
    pub period_us: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period_us: DEFAULT_SAMPLE_PERIOD_US,
        }
    }
}

// ─── Bus ────────────────────────────────────────────────────────────

fn default_status_lane() -> usize {
    DEFAULT_STATUS_LANE
}
fn default_tx_poll_limit() -> u32 {
    DEFAULT_TX_POLL_LIMIT
}

/// Bus link settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Transmit lane used for status replies (default: 0).
    #[serde(default = "default_status_lane")]
    pub status_lane: usize,

    /// Completion polls before a lane is declared unresponsive (default: 10000).
    #[serde(default = "default_tx_poll_limit")]
    pub tx_poll_limit: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            status_lane: DEFAULT_STATUS_LANE,
            tx_poll_limit: DEFAULT_TX_POLL_LIMIT,
        }
    }
}

// ─── Sequencer ──────────────────────────────────────────────────────

fn default_settle_ms() -> u32 {
    DEFAULT_SETTLE_MS
}

/// Handling of a phase request that arrives while a transition settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlePolicy {
    /// Apply immediately and restart the settle window.
    #[default]
    Restart,
    /// Remember the latest request and apply it when the window expires.
    Queue,
}

/// Rotary sequencer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Settle window after each transition in milliseconds (default: 1000).
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,

    /// Request handling while settling (default: restart).
    #[serde(default)]
    pub settle_policy: SettlePolicy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            settle_policy: SettlePolicy::default(),
        }
    }
}
