//! # Lens Control Core
//!
//! Real-time control of a motorized lens/polarizer actuator: a field-bus
//! command/status link, a timer-triggered position sampler, a three-phase
//! rotary selector sequencer and a bang-bang focus servo, joined by one
//! lock-free shared state.
//!
//! ## Contexts
//!
//! 1. **Bus receive** writes the targets ([`bus`])
//! 2. **Acquisition complete** publishes samples ([`sampler`])
//! 3. **Settle timer** releases the rotary bridges ([`sequencer`])
//! 4. **Main loop** converges the actuators on the targets ([`cycle`], [`servo`])
//!
//! Each context owns one writer port of [`shared::SharedControlState`], so
//! every shared field has exactly one writer.
//!
//! ## Running on a host
//!
//! Peripherals are `lens_common::hal` traits. With the `sim` feature
//! (default) [`sim`] wires the core to the `lens_sim` board, which the
//! `lens_control` binary runs against. Targets with their own drivers
//! build with `default-features = false`.

pub mod bus;
pub mod config;
pub mod cycle;
pub mod error;
pub mod sampler;
pub mod sequencer;
pub mod servo;
pub mod shared;
#[cfg(feature = "sim")]
pub mod sim;
