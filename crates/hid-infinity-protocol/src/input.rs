//! Input report parsing (32-byte HID input report).
//!
//! # Report kinds
//! | Byte 0 | Meaning                                                   |
//! |--------|-----------------------------------------------------------|
//! | `0xAA` | reply: `[0xAA, length, message_id, payload..]`            |
//! | `0xAB` | a tag was placed on or removed from one of the platforms  |
//!
//! The reply payload spans bytes `3..length + 2`. The trailing checksum is
//! not verified.

use serde::{Deserialize, Serialize};

/// First byte of a reply report.
pub const REPLY_MARKER: u8 = 0xAA;

/// First byte of a tag-change notification.
pub const TAGS_CHANGED_MARKER: u8 = 0xAB;

/// Tag index byte that marks an empty slot.
const EMPTY_SLOT: u8 = 0x09;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundReport {
    /// Answer to the request sent with `message_id`.
    Reply { message_id: u8, payload: Vec<u8> },
    /// The set of tags on the base changed; re-query the tag index.
    TagsChanged { raw: Vec<u8> },
    /// Anything the driver does not understand.
    Unknown(Vec<u8>),
}

/// Classify one input report.
pub fn parse_report(data: &[u8]) -> InboundReport {
    match data {
        [REPLY_MARKER, length, message_id, ..] => {
            let end = (usize::from(*length) + 2).min(data.len());
            let payload = data.get(3..end).map(<[u8]>::to_vec).unwrap_or_default();
            InboundReport::Reply {
                message_id: *message_id,
                payload,
            }
        }
        [TAGS_CHANGED_MARKER, ..] => InboundReport::TagsChanged { raw: data.to_vec() },
        _ => InboundReport::Unknown(data.to_vec()),
    }
}

/// One occupied entry of the tag index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSlot {
    /// Platform number the tag sits on (high nibble).
    pub platform: u8,
    /// Tag index to pass to the get-tag command (low nibble).
    pub index: u8,
}

/// Decode the payload of a tag index reply.
pub fn parse_tag_index(payload: &[u8]) -> Vec<TagSlot> {
    payload
        .iter()
        .filter(|b| **b != EMPTY_SLOT)
        .map(|b| TagSlot {
            platform: (b & 0xF0) >> 4,
            index: b & 0x0F,
        })
        .collect()
}
