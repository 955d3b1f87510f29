//! Bus frames.
//!
//! Standard 11-bit identifiers, fixed 8-byte payload split in two 32-bit
//! words. Frames are consumed or sent synchronously; the core never queues
//! them.

use serde::{Deserialize, Serialize};

use crate::consts::{BUS_ID_COMMAND, BUS_ID_STATUS, FRAME_DLC};

/// Identifiers this node understands.
///
/// `StatusRequest` and `Status` share identifier 0x93 and differ only in
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    /// Inbound request for a status report. Payload ignored.
    StatusRequest,
    /// Inbound focus/rotary command.
    Command,
    /// Outbound status report.
    Status,
}

impl MessageId {
    /// Map a received identifier. Returns `None` for identifiers outside
    /// the accepted set.
    #[inline]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            BUS_ID_STATUS => Some(Self::StatusRequest),
            BUS_ID_COMMAND => Some(Self::Command),
            _ => None,
        }
    }

    /// Raw identifier on the wire.
    #[inline]
    pub const fn raw(self) -> u16 {
        match self {
            Self::StatusRequest | Self::Status => BUS_ID_STATUS,
            Self::Command => BUS_ID_COMMAND,
        }
    }
}

/// Identifiers installed in the hardware acceptance filter.
pub const ACCEPTED_IDS: [u16; 2] = [BUS_ID_COMMAND, BUS_ID_STATUS];

/// A received frame, already matched to a known identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    /// First payload word (bytes 0..4, little-endian).
    pub data_low: u32,
    /// Second payload word (bytes 4..8).
    pub data_high: u32,
    pub dlc: u8,
}

impl InboundMessage {
    pub const fn new(id: MessageId, data_low: u32, data_high: u32) -> Self {
        Self {
            id,
            data_low,
            data_high,
            dlc: FRAME_DLC,
        }
    }
}

/// A frame to transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: MessageId,
    pub dlc: u8,
    pub data_low: u32,
    pub data_high: u32,
}

impl OutboundMessage {
    /// Status report carrying `data_low`; `data_high` is always zero.
    pub const fn status(data_low: u32) -> Self {
        Self {
            id: MessageId::Status,
            dlc: FRAME_DLC,
            data_low,
            data_high: 0,
        }
    }

    /// Raw identifier on the wire.
    #[inline]
    pub const fn raw_id(&self) -> u16 {
        self.id.raw()
    }
}
