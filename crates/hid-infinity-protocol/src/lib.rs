//! Disney Infinity base USB HID protocol.
//!
//! The Disney Infinity "toy-to-life" base reads NFC figures and discs placed on
//! its three platforms and drives an RGB LED under each one. The Wii and
//! PlayStation model enumerates as VID `0x0E6F` / PID `0x0129`; the Xbox
//! models use a different transport and are out of scope.
//!
//! # Protocol Overview
//! The host talks to the base with 33-byte output reports (report id `0x00`
//! followed by 32 bytes) and receives 32-byte input reports.
//!
//! Each output report carries one framed command:
//!
//! | Offset | Field                                     |
//! |--------|-------------------------------------------|
//! | 0      | report id `0x00`                          |
//! | 1      | frame marker `0xFF`                       |
//! | 2      | body length (command + message id + data) |
//! | 3      | command byte                              |
//! | 4      | message id                                |
//! | 5..    | command data                              |
//! | next   | 8-bit wrapping sum of all previous bytes  |
//!
//! Input reports start with `0xAA` (reply to a message id) or `0xAB`
//! (a figure was placed on or removed from the base).
//!
//! This crate is I/O-free: it only builds and parses byte buffers. Transport
//! lives in `infinity-hid-common`, request/response correlation in
//! `infinity-base`.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod input;
pub mod output;
pub mod types;

pub use ids::{PRODUCT_BASE, VENDOR_ID, is_infinity_base, product_name};
pub use input::{
    InboundReport, REPLY_MARKER, TAGS_CHANGED_MARKER, TagSlot, parse_report, parse_tag_index,
};
pub use output::{
    ACTIVATION_MESSAGE, Command, FRAME_MARKER, FrameError, MAX_DATA_LEN, checksum, encode_frame,
};
pub use types::{Color, Platform, PlatformId};

/// Input report length in bytes.
pub const IN_REPORT_LEN: usize = 32;

/// Output report length in bytes (report id + 32 bytes).
pub const OUT_REPORT_LEN: usize = 33;

/// Report id prefixed to every output report.
pub const OUT_REPORT_ID: u8 = 0x00;
