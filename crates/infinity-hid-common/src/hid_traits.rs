//! HID device traits

use crate::{HidCommonResult, HidDeviceInfo};
use std::time::Duration;

/// An open HID device that exchanges raw reports.
pub trait HidTransport: Send {
    /// Write one output report, including its report id byte.
    fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize>;

    /// Read one input report into `buf`, waiting at most `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived in time.
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize>;

    fn device_info(&self) -> &HidDeviceInfo;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> HidCommonResult<()>;
}

/// Enumerates and opens HID devices.
pub trait HidPort: Send + Sync {
    fn list_devices(&self) -> HidCommonResult<Vec<HidDeviceInfo>>;

    fn open(&self, vendor_id: u16, product_id: u16) -> HidCommonResult<Box<dyn HidTransport>>;

    fn open_path(&self, path: &str) -> HidCommonResult<Box<dyn HidTransport>>;
}

pub mod mock {
    use super::*;
    use crate::HidCommonError;
    use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Produces the input reports a device sends back for one written report.
    pub type Responder = Arc<dyn Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync>;

    /// Scripted in-memory HID device.
    ///
    /// Clones share the same queues, so a test can keep one handle while the
    /// driver owns another.
    #[derive(Clone)]
    pub struct MockHidTransport {
        info: HidDeviceInfo,
        inbox_tx: Sender<Vec<u8>>,
        inbox_rx: Receiver<Vec<u8>>,
        write_history: Arc<Mutex<Vec<Vec<u8>>>>,
        connected: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
        deny_open: Arc<AtomicBool>,
        responder: Arc<Mutex<Option<Responder>>>,
    }

    impl MockHidTransport {
        pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
            let (inbox_tx, inbox_rx) = channel::unbounded();
            Self {
                info: HidDeviceInfo::new(vendor_id, product_id, path),
                inbox_tx,
                inbox_rx,
                write_history: Arc::new(Mutex::new(Vec::new())),
                connected: Arc::new(AtomicBool::new(true)),
                fail_writes: Arc::new(AtomicBool::new(false)),
                deny_open: Arc::new(AtomicBool::new(false)),
                responder: Arc::new(Mutex::new(None)),
            }
        }

        pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
            self.info = self.info.with_product_name(name);
            self
        }

        /// Install a responder that answers every written report.
        pub fn respond_with<F>(&self, responder: F)
        where
            F: Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
        {
            *self.responder.lock() = Some(Arc::new(responder));
        }

        /// Queue an unsolicited input report.
        pub fn queue_read(&self, data: Vec<u8>) {
            if self.inbox_tx.send(data).is_err() {
                tracing::debug!("mock inbox closed");
            }
        }

        pub fn get_write_history(&self) -> Vec<Vec<u8>> {
            self.write_history.lock().clone()
        }

        pub fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }

        pub fn reconnect(&self) {
            self.connected.store(true, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make the port list this device but refuse to open it, as happens
        /// with missing hidraw permissions.
        pub fn set_deny_open(&self, deny: bool) {
            self.deny_open.store(deny, Ordering::SeqCst);
        }

        fn open_denied(&self) -> bool {
            self.deny_open.load(Ordering::SeqCst)
        }
    }

    impl HidTransport for MockHidTransport {
        fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
            if !self.connected.load(Ordering::SeqCst) {
                return Err(HidCommonError::Disconnected);
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(HidCommonError::WriteError("injected failure".to_string()));
            }

            self.write_history.lock().push(data.to_vec());

            let responder = self.responder.lock().clone();
            if let Some(responder) = responder {
                for report in responder(data) {
                    self.queue_read(report);
                }
            }
            Ok(data.len())
        }

        fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize> {
            if !self.connected.load(Ordering::SeqCst) {
                return Err(HidCommonError::Disconnected);
            }

            match self.inbox_rx.recv_timeout(timeout) {
                Ok(report) => {
                    let n = report.len().min(buf.len());
                    for (slot, byte) in buf.iter_mut().zip(report.iter()) {
                        *slot = *byte;
                    }
                    Ok(n)
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.connected.load(Ordering::SeqCst) {
                        Ok(0)
                    } else {
                        Err(HidCommonError::Disconnected)
                    }
                }
                Err(RecvTimeoutError::Disconnected) => Err(HidCommonError::Disconnected),
            }
        }

        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn close(&mut self) -> HidCommonResult<()> {
            self.disconnect();
            Ok(())
        }
    }

    pub struct MockHidPort {
        devices: Vec<MockHidTransport>,
        fail_enumeration: bool,
    }

    impl MockHidPort {
        pub fn new() -> Self {
            Self {
                devices: Vec::new(),
                fail_enumeration: false,
            }
        }

        pub fn add_device(&mut self, device: MockHidTransport) {
            self.devices.push(device);
        }

        pub fn with_device(mut self, device: MockHidTransport) -> Self {
            self.add_device(device);
            self
        }

        pub fn failing_enumeration(mut self) -> Self {
            self.fail_enumeration = true;
            self
        }

        pub fn device_count(&self) -> usize {
            self.devices.len()
        }

        fn open_device(
            &self,
            device: Option<&MockHidTransport>,
            what: String,
        ) -> HidCommonResult<Box<dyn HidTransport>> {
            match device {
                Some(device) if device.open_denied() => {
                    Err(HidCommonError::OpenError(format!("{what}: permission denied")))
                }
                Some(device) => {
                    device.reconnect();
                    Ok(Box::new(device.clone()))
                }
                None => Err(HidCommonError::DeviceNotFound(what)),
            }
        }
    }

    impl HidPort for MockHidPort {
        fn list_devices(&self) -> HidCommonResult<Vec<HidDeviceInfo>> {
            if self.fail_enumeration {
                return Err(HidCommonError::Backend("enumeration failed".to_string()));
            }
            Ok(self
                .devices
                .iter()
                .map(|d| d.device_info().clone())
                .collect())
        }

        fn open(&self, vendor_id: u16, product_id: u16) -> HidCommonResult<Box<dyn HidTransport>> {
            let device = self
                .devices
                .iter()
                .find(|d| d.info.matches(vendor_id, product_id));
            self.open_device(device, format!("{vendor_id:04x}:{product_id:04x}"))
        }

        fn open_path(&self, path: &str) -> HidCommonResult<Box<dyn HidTransport>> {
            let device = self.devices.iter().find(|d| d.info.path == path);
            self.open_device(device, path.to_string())
        }
    }

    impl Default for MockHidPort {
        fn default() -> Self {
            Self::new()
        }
    }
}
