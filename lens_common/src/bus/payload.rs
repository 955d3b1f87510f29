//! Payload field layout of the first data word.
//!
//! | bits | field |
//! |------|-------|
//! | 7:0  | rotary selector |
//! | 15:8 | focus value |
//!
//! Commands and status reports use the same layout.

use crate::consts::{FOCUS_FIELD_MSK, FOCUS_FIELD_POS, ROTARY_FIELD_MSK, ROTARY_FIELD_POS};
use crate::control::types::Phase;

/// Raw fields of a command word. Not validated: range checks belong to the
/// receiver, which accepts each field independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFields {
    pub rotary: u8,
    pub focus: u8,
}

impl CommandFields {
    /// Split a command word into its fields. Bits above 15 are ignored.
    #[inline]
    pub const fn decode(data_low: u32) -> Self {
        Self {
            rotary: ((data_low & ROTARY_FIELD_MSK) >> ROTARY_FIELD_POS) as u8,
            focus: ((data_low & FOCUS_FIELD_MSK) >> FOCUS_FIELD_POS) as u8,
        }
    }
}

/// Build the first word of a status report.
///
/// `position` is truncated to the 8-bit field.
#[inline]
pub const fn encode_status(position: u32, rotary: Phase) -> u32 {
    ((position << FOCUS_FIELD_POS) & FOCUS_FIELD_MSK)
        | (((rotary as u32) << ROTARY_FIELD_POS) & ROTARY_FIELD_MSK)
}
