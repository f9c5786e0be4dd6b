//! Output report encoding (33-byte HID output report, report id 0x00).
//!
//! # Frame layout
//! | Offset  | Size | Field                                        |
//! |---------|------|----------------------------------------------|
//! | 0       | 1    | report id `0x00`                             |
//! | 1       | 1    | frame marker `0xFF`                          |
//! | 2       | 1    | body length `L` = 2 + data length            |
//! | 3       | 1    | command                                      |
//! | 4       | 1    | message id                                   |
//! | 5       | n    | data                                         |
//! | 3 + L   | 1    | checksum: wrapping sum of bytes `0..3+L`     |
//! | rest    |      | zero padding                                 |

use crate::types::{Color, PlatformId};
use crate::{OUT_REPORT_ID, OUT_REPORT_LEN};
use thiserror::Error;

/// Second byte of every outbound frame.
pub const FRAME_MARKER: u8 = 0xFF;

/// Header bytes before the data: report id, marker, length, command, message id.
const HEADER_LEN: usize = 5;

/// Largest data block that still leaves room for the checksum byte.
pub const MAX_DATA_LEN: usize = OUT_REPORT_LEN - HEADER_LEN - 1;

/// Payload of the activation command: ASCII `(c) Disney 2013`.
pub const ACTIVATION_MESSAGE: [u8; 15] = *b"(c) Disney 2013";

pub const CMD_ACTIVATE: u8 = 0x80;
pub const CMD_SET_COLOR: u8 = 0x90;
pub const CMD_FADE_COLOR: u8 = 0x92;
pub const CMD_FLASH_COLOR: u8 = 0x93;
pub const CMD_GET_TAG_INDEX: u8 = 0xA1;
pub const CMD_GET_TAG: u8 = 0xB4;

/// Fixed timing bytes sent with a fade request.
const FADE_TIMING: [u8; 2] = [0x10, 0x02];

/// Fixed timing bytes sent with a flash request.
const FLASH_TIMING: [u8; 3] = [0x02, 0x02, 0x06];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("command data too long: {len} bytes, at most {max} fit in one report")]
    PayloadTooLong { len: usize, max: usize },
}

/// A request the host can send to the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Wake the base up; must be sent once after opening the device.
    Activate,
    /// Set a platform LED to a color immediately.
    SetColor { platform: PlatformId, color: Color },
    /// Fade a platform LED towards a color.
    FadeColor { platform: PlatformId, color: Color },
    /// Flash a platform LED in a color.
    FlashColor { platform: PlatformId, color: Color },
    /// Ask which tags are present and on which platform.
    GetTagIndex,
    /// Read the data of one tag by its index.
    GetTag { index: u8 },
    /// Any other command byte, for protocol exploration.
    Raw {
        code: u8,
        data: Vec<u8>,
        expects_reply: bool,
    },
}

impl Command {
    pub fn code(&self) -> u8 {
        match self {
            Command::Activate => CMD_ACTIVATE,
            Command::SetColor { .. } => CMD_SET_COLOR,
            Command::FadeColor { .. } => CMD_FADE_COLOR,
            Command::FlashColor { .. } => CMD_FLASH_COLOR,
            Command::GetTagIndex => CMD_GET_TAG_INDEX,
            Command::GetTag { .. } => CMD_GET_TAG,
            Command::Raw { code, .. } => *code,
        }
    }

    pub fn data(&self) -> Vec<u8> {
        match self {
            Command::Activate => ACTIVATION_MESSAGE.to_vec(),
            Command::SetColor { platform, color } => {
                let mut data = vec![platform.0];
                data.extend_from_slice(&color.to_bytes());
                data
            }
            Command::FadeColor { platform, color } => {
                let mut data = vec![platform.0];
                data.extend_from_slice(&FADE_TIMING);
                data.extend_from_slice(&color.to_bytes());
                data
            }
            Command::FlashColor { platform, color } => {
                let mut data = vec![platform.0];
                data.extend_from_slice(&FLASH_TIMING);
                data.extend_from_slice(&color.to_bytes());
                data
            }
            Command::GetTagIndex => Vec::new(),
            Command::GetTag { index } => vec![*index],
            Command::Raw { data, .. } => data.clone(),
        }
    }

    /// Whether the base answers this command with an `0xAA` reply.
    pub fn expects_reply(&self) -> bool {
        match self {
            Command::GetTagIndex | Command::GetTag { .. } => true,
            Command::Raw { expects_reply, .. } => *expects_reply,
            _ => false,
        }
    }

    /// Build the full output report for this command.
    ///
    /// # Errors
    /// Returns [`FrameError::PayloadTooLong`] when a raw command carries more
    /// than [`MAX_DATA_LEN`] bytes.
    pub fn encode(&self, message_id: u8) -> Result<[u8; OUT_REPORT_LEN], FrameError> {
        encode_frame(self.code(), message_id, &self.data())
    }
}

/// 8-bit wrapping sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode one command into a zero-padded 33-byte output report.
///
/// # Errors
/// Returns [`FrameError::PayloadTooLong`] if `data` exceeds [`MAX_DATA_LEN`].
pub fn encode_frame(
    command: u8,
    message_id: u8,
    data: &[u8],
) -> Result<[u8; OUT_REPORT_LEN], FrameError> {
    if data.len() > MAX_DATA_LEN {
        return Err(FrameError::PayloadTooLong {
            len: data.len(),
            max: MAX_DATA_LEN,
        });
    }

    // data.len() <= 27, so the body length always fits a byte
    let body_len = (data.len() + 2) as u8;
    let header = [OUT_REPORT_ID, FRAME_MARKER, body_len, command, message_id];

    let mut frame = [0u8; OUT_REPORT_LEN];
    let mut sum = 0u8;
    let mut written = 0usize;
    for (slot, byte) in frame.iter_mut().zip(header.iter().chain(data.iter())) {
        *slot = *byte;
        sum = sum.wrapping_add(*byte);
        written += 1;
    }
    if let Some(slot) = frame.get_mut(written) {
        *slot = sum;
    }

    Ok(frame)
}
