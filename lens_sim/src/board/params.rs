//! Simulation parameters.

use lens_common::consts::SAMPLE_MASK;
use serde::{Deserialize, Serialize};

fn default_focus_slew() -> f64 {
    2.0
}
fn default_rotary_rate() -> f64 {
    0.002
}
fn default_temperature() -> u32 {
    1750
}
fn default_reference() -> u32 {
    1500
}
fn default_tx_latency() -> u32 {
    1
}
fn default_filter_capacity() -> usize {
    8
}

/// Physical and timing parameters of the simulated board.
///
/// # TOML Example
///
/// ```toml
/// initial_position_raw = 2000
/// focus_slew_per_ms = 4.0
/// noise_counts = 3
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Focus carriage start position [raw counts].
    #[serde(default)]
    pub initial_position_raw: u32,

    /// Focus carriage speed while driven [raw counts/ms] (default: 2.0).
    #[serde(default = "default_focus_slew")]
    pub focus_slew_per_ms: f64,

    /// Start travel of axis pairs A and B, each in [0, 1].
    #[serde(default)]
    pub initial_rotary: (f64, f64),

    /// Rotary axis travel speed while driven [travel/ms] (default: 0.002).
    #[serde(default = "default_rotary_rate")]
    pub rotary_rate_per_ms: f64,

    /// Fixed temperature channel [raw counts].
    #[serde(default = "default_temperature")]
    pub temperature_raw: u32,

    /// Fixed reference channel [raw counts].
    #[serde(default = "default_reference")]
    pub reference_raw: u32,

    /// Peak uniform noise added to the position channel [raw counts].
    #[serde(default)]
    pub noise_counts: u32,

    /// Noise generator seed.
    #[serde(default)]
    pub seed: u64,

    /// Completion polls a transmit lane stays pending (default: 1).
    #[serde(default = "default_tx_latency")]
    pub tx_latency_polls: u32,

    /// Acceptance filter slots of the bus controller (default: 8).
    #[serde(default = "default_filter_capacity")]
    pub filter_capacity: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_position_raw: 0,
            focus_slew_per_ms: default_focus_slew(),
            initial_rotary: (0.0, 0.0),
            rotary_rate_per_ms: default_rotary_rate(),
            temperature_raw: default_temperature(),
            reference_raw: default_reference(),
            noise_counts: 0,
            seed: 0,
            tx_latency_polls: default_tx_latency(),
            filter_capacity: default_filter_capacity(),
        }
    }
}

impl SimParams {
    /// Largest position the carriage can reach [raw counts].
    pub const POSITION_LIMIT: u32 = SAMPLE_MASK;
}
