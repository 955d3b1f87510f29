//! System-wide constants for the lens workspace.
//!
//! Single source of truth for protocol identifiers, payload field layout and
//! sample scaling. Imported by all crates. No duplication permitted.

use static_assertions::const_assert;

// ─── Bus identifiers ────────────────────────────────────────────────

/// Identifier of the status-request message (inbound) and the status
/// report (outbound).
pub const BUS_ID_STATUS: u16 = 0x93;

/// Identifier of the command message (inbound).
pub const BUS_ID_COMMAND: u16 = 0x92;

/// Largest valid standard (11-bit) identifier.
pub const BUS_ID_MAX: u16 = 0x7FF;

/// Payload length of every frame on this link.
pub const FRAME_DLC: u8 = 8;

/// Number of independent transmit lanes on the bus peripheral.
pub const TX_LANES: usize = 3;

// ─── Payload field layout (first data word) ─────────────────────────

/// Bit position of the rotary selector field.
pub const ROTARY_FIELD_POS: u32 = 0;
/// Mask of the rotary selector field.
pub const ROTARY_FIELD_MSK: u32 = 0x0000_00FF;

/// Bit position of the focus field.
pub const FOCUS_FIELD_POS: u32 = 8;
/// Mask of the focus field.
pub const FOCUS_FIELD_MSK: u32 = 0x0000_FF00;

// ─── Focus scaling ──────────────────────────────────────────────────

/// Largest accepted focus target [scaled units].
pub const FOCUS_MAX: u32 = 255;

/// Significant bits of a raw conversion result (12-bit converter).
pub const SAMPLE_MASK: u32 = 0x0000_0FFF;

/// Integer divider from masked raw counts to the scaled position unit.
pub const FOCUS_DIVIDER: u32 = 100;

/// Number of channels converted per sampling period.
pub const SAMPLE_CHANNELS: usize = 3;

// ─── Timing defaults ────────────────────────────────────────────────

/// Default sampling period in microseconds (1 kHz trigger).
pub const DEFAULT_SAMPLE_PERIOD_US: u32 = 1000;

/// Default settle window of the rotary selector in milliseconds.
pub const DEFAULT_SETTLE_MS: u32 = 1000;

/// Default number of completion polls before a lane is declared unresponsive.
pub const DEFAULT_TX_POLL_LIMIT: u32 = 10_000;

/// Default lane used for status replies.
pub const DEFAULT_STATUS_LANE: usize = 0;

const_assert!(FOCUS_MAX <= FOCUS_FIELD_MSK >> FOCUS_FIELD_POS);
const_assert!(SAMPLE_MASK / FOCUS_DIVIDER <= FOCUS_FIELD_MSK >> FOCUS_FIELD_POS);
const_assert!(DEFAULT_STATUS_LANE < TX_LANES);
const_assert!(BUS_ID_STATUS <= BUS_ID_MAX && BUS_ID_COMMAND <= BUS_ID_MAX);
