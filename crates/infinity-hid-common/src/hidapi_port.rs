//! `hidapi`-backed implementation of [`HidPort`] and [`HidTransport`].

use crate::{HidCommonError, HidCommonResult, HidDeviceInfo, HidPort, HidTransport};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use parking_lot::Mutex;
use std::ffi::CString;
use std::time::Duration;
use tracing::{debug, trace};

/// Owns the process-wide `HidApi` context.
pub struct HidApiPort {
    api: Mutex<HidApi>,
}

impl HidApiPort {
    /// Initialise the HID library.
    ///
    /// # Errors
    /// Fails when the native hidapi backend cannot be initialised.
    pub fn new() -> HidCommonResult<Self> {
        let api = HidApi::new()?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl HidPort for HidApiPort {
    fn list_devices(&self) -> HidCommonResult<Vec<HidDeviceInfo>> {
        let mut api = self.api.lock();
        api.refresh_devices()?;
        let devices: Vec<HidDeviceInfo> = api.device_list().map(device_info_from_hidapi).collect();
        debug!(count = devices.len(), "enumerated HID devices");
        Ok(devices)
    }

    fn open(&self, vendor_id: u16, product_id: u16) -> HidCommonResult<Box<dyn HidTransport>> {
        let api = self.api.lock();
        let device = api.open(vendor_id, product_id).map_err(|e| {
            HidCommonError::OpenError(format!("{vendor_id:04x}:{product_id:04x}: {e}"))
        })?;
        let info = device
            .get_device_info()
            .map(|d| device_info_from_hidapi(&d))
            .unwrap_or_else(|_| HidDeviceInfo::new(vendor_id, product_id, String::new()));
        Ok(Box::new(HidApiTransport::new(device, info)?))
    }

    fn open_path(&self, path: &str) -> HidCommonResult<Box<dyn HidTransport>> {
        let c_path = CString::new(path)
            .map_err(|e| HidCommonError::OpenError(format!("invalid device path {path:?}: {e}")))?;
        let api = self.api.lock();
        let device = api
            .open_path(&c_path)
            .map_err(|e| HidCommonError::OpenError(format!("{path}: {e}")))?;
        let info = device
            .get_device_info()
            .map(|d| device_info_from_hidapi(&d))
            .unwrap_or_else(|_| HidDeviceInfo::new(0, 0, path));
        Ok(Box::new(HidApiTransport::new(device, info)?))
    }
}

pub fn device_info_from_hidapi(device: &DeviceInfo) -> HidDeviceInfo {
    let mut info = HidDeviceInfo::new(
        device.vendor_id(),
        device.product_id(),
        device.path().to_string_lossy().into_owned(),
    );
    if let Some(serial) = device.serial_number() {
        info = info.with_serial(serial);
    }
    if let Some(manufacturer) = device.manufacturer_string() {
        info = info.with_manufacturer(manufacturer);
    }
    if let Some(product) = device.product_string() {
        info = info.with_product_name(product);
    }
    info
}

/// An open `hidapi` device in blocking mode.
pub struct HidApiTransport {
    device: Option<HidDevice>,
    info: HidDeviceInfo,
}

impl HidApiTransport {
    fn new(device: HidDevice, info: HidDeviceInfo) -> HidCommonResult<Self> {
        device.set_blocking_mode(true)?;
        Ok(Self {
            device: Some(device),
            info,
        })
    }

    fn device(&self) -> HidCommonResult<&HidDevice> {
        self.device.as_ref().ok_or(HidCommonError::Disconnected)
    }
}

impl HidTransport for HidApiTransport {
    fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
        trace!(len = data.len(), "hid write");
        self.device()?
            .write(data)
            .map_err(|e| HidCommonError::WriteError(e.to_string()))
    }

    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        self.device()?
            .read_timeout(buf, timeout_ms)
            .map_err(|e| HidCommonError::ReadError(e.to_string()))
    }

    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) -> HidCommonResult<()> {
        // hidapi closes the handle on drop
        self.device = None;
        Ok(())
    }
}
