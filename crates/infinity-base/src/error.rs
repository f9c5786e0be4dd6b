//! Error types for the Infinity base driver

use crate::udev::UDEV_RULE_PATH;
use infinity_hid_common::HidCommonError;
use infinity_hid_protocol::FrameError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfinityError {
    #[error("No Disney Infinity base found (VID={vendor_id:04x} PID={product_id:04x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error(
        "Base found but couldn't be opened ({reason}). On Linux this is usually /dev/hidraw* \
         permissions: try sudo once, then install the udev rule at {rule}",
        rule = UDEV_RULE_PATH
    )]
    DeviceOpen { reason: String },

    #[error("Not connected, call connect() first")]
    NotConnected,

    #[error("Write failed: {0}")]
    Write(#[source] HidCommonError),

    #[error("No reply to message {message_id} within {timeout:?}")]
    Timeout { message_id: u8, timeout: Duration },

    #[error("Reader thread stopped before response arrived")]
    ReaderStopped,

    #[error("Device disconnected before response arrived")]
    Disconnected,

    #[error("Reply slot for message {message_id} was reused before the response arrived")]
    ReplyLost { message_id: u8 },

    #[error("Failed to start reader thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Hid(#[from] HidCommonError),
}

pub type InfinityResult<T> = Result<T, InfinityError>;
