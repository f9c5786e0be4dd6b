//! Common HID plumbing for the Infinity base toolkit
//!
//! This crate hides the HID library behind two small traits so the driver can
//! run against real hardware through `hidapi` or against scripted mock
//! devices in tests.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
pub mod hidapi_port;

pub use device_info::*;
pub use hid_traits::*;
pub use hidapi_port::HidApiPort;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("HID backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hidapi::HidError> for HidCommonError {
    fn from(err: hidapi::HidError) -> Self {
        HidCommonError::Backend(err.to_string())
    }
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = HidCommonError::DeviceNotFound("0e6f:0129".to_string());
        assert_eq!(format!("{}", err), "Device not found: 0e6f:0129");

        let err = HidCommonError::Disconnected;
        assert_eq!(format!("{}", err), "Device disconnected");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "hidraw0");
        let err = HidCommonError::from(io);
        assert!(matches!(err, HidCommonError::Io(_)));
        assert_eq!(err.to_string(), "IO error: hidraw0");
    }
}
