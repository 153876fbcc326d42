//! Message header and flag bits.
//!
//! Every WebSocket binary message begins with an Avro-encoded
//! `MessageHeader`; the body schema is selected by the
//! `(protocol, message_type)` pair.  Flag semantics:
//!
//! - `MULTIPART` on a frame means more frames with the same `message_id`
//!   follow; a frame *without* it completes its logical message.
//! - `FINAL` marks the last message of a correlation stream.  A message
//!   split across N frames therefore carries `MULTIPART` on frames
//!   `1..N-1` and `FINAL` alone on frame N, so exactly one frame of any
//!   logical message has `FINAL` set.

use std::fmt;
use std::ops::BitOr;

/// Header flag bitset.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageFlags(pub i32);

impl MessageFlags {
    pub const NONE: Self = Self(0);
    /// More frames with this `message_id` follow.
    pub const MULTIPART: Self = Self(0x01);
    /// Last message of the correlation stream.
    pub const FINAL: Self = Self(0x02);
    /// The body carries no data.
    pub const NO_DATA: Self = Self(0x04);
    /// The body is compressed (not produced by this client).
    pub const COMPRESSED: Self = Self(0x08);
    /// Acknowledgement requested / carried.
    pub const ACK: Self = Self(0x10);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> i32 {
        self.0
    }
}

impl BitOr for MessageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for MessageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::MULTIPART) {
            names.push("MULTIPART");
        }
        if self.contains(Self::FINAL) {
            names.push("FINAL");
        }
        if self.contains(Self::NO_DATA) {
            names.push("NO_DATA");
        }
        if self.contains(Self::COMPRESSED) {
            names.push("COMPRESSED");
        }
        if self.contains(Self::ACK) {
            names.push("ACK");
        }
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// The fixed header preceding every message body.
///
/// Invariants: `message_id` is unique per direction per session and
/// strictly increasing; a request's `correlation_id` is 0; a reply's
/// `correlation_id` equals the originating request's `message_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub protocol: i32,
    pub message_type: i32,
    pub correlation_id: i64,
    pub message_id: i64,
    pub message_flags: MessageFlags,
}

impl MessageHeader {
    pub fn new(protocol: i32, message_type: i32, message_id: i64, correlation_id: i64) -> Self {
        Self {
            protocol,
            message_type,
            correlation_id,
            message_id,
            message_flags: MessageFlags::FINAL,
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.message_flags = flags;
        self
    }

    pub fn is_final(&self) -> bool {
        self.message_flags.contains(MessageFlags::FINAL)
    }

    pub fn is_multipart(&self) -> bool {
        self.message_flags.contains(MessageFlags::MULTIPART)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_match_the_wire_values() {
        assert_eq!(MessageFlags::MULTIPART.bits(), 0x01);
        assert_eq!(MessageFlags::FINAL.bits(), 0x02);
        assert_eq!(MessageFlags::NO_DATA.bits(), 0x04);
        assert_eq!(MessageFlags::COMPRESSED.bits(), 0x08);
        assert_eq!(MessageFlags::ACK.bits(), 0x10);
    }

    #[test]
    fn flag_union_and_containment() {
        let flags = MessageFlags::MULTIPART | MessageFlags::FINAL;
        assert!(flags.contains(MessageFlags::MULTIPART));
        assert!(flags.contains(MessageFlags::FINAL));
        assert!(!flags.contains(MessageFlags::ACK));
    }

    #[test]
    fn new_header_defaults_to_final() {
        let header = MessageHeader::new(0, 1, 2, 0);
        assert!(header.is_final());
        assert!(!header.is_multipart());
    }
}
