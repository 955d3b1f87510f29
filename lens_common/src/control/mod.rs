//! Control core data types.
//!
//! Types exchanged between the control core, its peripherals and its
//! configuration:
//!
//! - [`types`] - Rotary phases, drive commands, position samples, scaling
//! - [`flags`] - Sticky per-subsystem status flags
//! - [`config`] - `LensConfig` and its sections

pub mod config;
pub mod flags;
pub mod types;

pub use flags::{StatusFlags, Subsystem};
pub use types::{AxisDrive, FocusDrive, Phase, PositionSample, Scaling};
