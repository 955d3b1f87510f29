//! Lens Common Library
//!
//! Shared vocabulary for the lens actuator workspace: numeric limits, the
//! field-bus frame codec, the peripheral traits the control core drives, and
//! the TOML configuration types.
//!
//! # Module Structure
//!
//! - [`consts`] - Protocol identifiers, field layout and scaling constants
//! - [`control`] - Phases, drive commands, samples, status flags, core config
//! - [`bus`] - Inbound/outbound messages and payload encoding
//! - [`hal`] - Peripheral traits implemented by real or simulated boards
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use lens_common::prelude::*;
//!
//! let fields = CommandFields::decode(0x0000_3202);
//! assert_eq!(fields.focus, 50);
//! assert_eq!(Phase::from_u8(fields.rotary), Some(Phase::Phase2));
//! ```

pub mod bus;
pub mod config;
pub mod consts;
pub mod control;
pub mod hal;
pub mod prelude;
