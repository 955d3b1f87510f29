//! Field-bus frames and payload layout.
//!
//! - [`frame`] - Message identifiers and inbound/outbound frames
//! - [`payload`] - Command field decoding and status word encoding

pub mod frame;
pub mod payload;

pub use frame::{InboundMessage, MessageId, OutboundMessage};
pub use payload::{CommandFields, encode_status};
