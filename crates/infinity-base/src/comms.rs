//! Background reader thread and request/response correlation.
//!
//! Every request carries a message id from an 8-bit counter. Requests that
//! expect an answer park a one-shot channel under that id; the reader thread
//! hands each `0xAA` reply to the matching slot and fans `0xAB` tag-change
//! notifications out to observers.

use crate::config::BaseConfig;
use crate::discovery::discover_bases;
use crate::error::{InfinityError, InfinityResult};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use infinity_hid_common::{HidDeviceInfo, HidPort, HidTransport};
use infinity_hid_protocol::{Command, IN_REPORT_LEN, InboundReport, parse_report};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Callback invoked on the reader thread with the raw `0xAB` report.
pub type Observer = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Why a parked request was failed by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyFailure {
    ReaderStopped,
    Disconnected,
}

type ReplyResult = Result<Vec<u8>, ReplyFailure>;

struct Slot {
    ticket: u64,
    tx: Sender<ReplyResult>,
}

struct Shared {
    transport: Mutex<Box<dyn HidTransport>>,
    pending: Mutex<HashMap<u8, Slot>>,
    message_number: Mutex<u8>,
    next_ticket: AtomicU64,
    observers: RwLock<Vec<Observer>>,
    stop: AtomicBool,
    poll_interval: Duration,
}

impl Shared {
    fn next_message_number(&self) -> u8 {
        let mut number = self.message_number.lock();
        *number = number.wrapping_add(1);
        *number
    }

    fn register(&self, message_id: u8) -> (u64, Receiver<ReplyResult>) {
        let (tx, rx) = channel::bounded(1);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if self
            .pending
            .lock()
            .insert(message_id, Slot { ticket, tx })
            .is_some()
        {
            debug!(message_id, "message id reused while a reply was outstanding");
        }
        (ticket, rx)
    }

    fn unregister(&self, message_id: u8, ticket: u64) {
        let mut pending = self.pending.lock();
        if pending.get(&message_id).is_some_and(|slot| slot.ticket == ticket) {
            pending.remove(&message_id);
        }
    }

    fn fail_pending(&self, failure: ReplyFailure) {
        let drained: Vec<Slot> = self.pending.lock().drain().map(|(_, slot)| slot).collect();
        for slot in drained {
            // the requester may already have timed out and dropped its receiver
            if slot.tx.send(Err(failure)).is_err() {
                trace!("requester gone before shutdown");
            }
        }
    }

    fn dispatch(&self, report: &[u8]) {
        match parse_report(report) {
            InboundReport::Reply {
                message_id,
                payload,
            } => {
                let slot = self.pending.lock().remove(&message_id);
                match slot {
                    Some(slot) => {
                        if slot.tx.send(Ok(payload)).is_err() {
                            debug!(message_id, "reply arrived after requester gave up");
                        }
                    }
                    None => debug!(message_id, ?report, "response with unknown message id"),
                }
            }
            InboundReport::TagsChanged { raw } => {
                let observers: Vec<Observer> = self.observers.read().clone();
                for observer in observers {
                    if catch_unwind(AssertUnwindSafe(|| observer(&raw))).is_err() {
                        warn!("tag observer panicked");
                    }
                }
            }
            InboundReport::Unknown(raw) => debug!(?raw, "unknown message"),
        }
    }
}

fn reader_loop(shared: Arc<Shared>) {
    let mut buf = [0u8; IN_REPORT_LEN];
    debug!("reader thread started");

    let failure = loop {
        if shared.stop.load(Ordering::SeqCst) {
            break ReplyFailure::ReaderStopped;
        }

        let read = {
            let mut transport = shared.transport.lock();
            let read = transport.read_report(&mut buf, shared.poll_interval);
            // writers are waiting on this lock between polls
            MutexGuard::unlock_fair(transport);
            read
        };

        match read {
            Ok(0) => continue,
            Ok(n) => shared.dispatch(buf.get(..n).unwrap_or(&buf)),
            Err(e) => {
                warn!(error = %e, "read from base failed, stopping reader");
                break ReplyFailure::Disconnected;
            }
        }
    };

    shared.fail_pending(failure);
    debug!(?failure, "reader thread stopped");
}

/// A request in flight.
#[must_use = "a pending reply does nothing unless waited on"]
pub struct PendingReply {
    message_id: u8,
    waiter: Option<Waiter>,
}

struct Waiter {
    ticket: u64,
    rx: Receiver<ReplyResult>,
    shared: Weak<Shared>,
}

impl PendingReply {
    pub fn message_id(&self) -> u8 {
        self.message_id
    }

    /// Whether this request is waiting for a reply from the base.
    pub fn expects_reply(&self) -> bool {
        self.waiter.is_some()
    }

    /// Block until the reply arrives.
    ///
    /// Requests without a reply resolve immediately to an empty payload.
    ///
    /// # Errors
    /// [`InfinityError::Timeout`] if nothing arrives within `timeout`;
    /// [`InfinityError::ReaderStopped`] or [`InfinityError::Disconnected`]
    /// if the reader ended first; [`InfinityError::ReplyLost`] if the message id
    /// was reused by a later request.
    pub fn wait(self, timeout: Duration) -> InfinityResult<Vec<u8>> {
        let Some(waiter) = self.waiter else {
            return Ok(Vec::new());
        };

        match waiter.rx.recv_timeout(timeout) {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(ReplyFailure::ReaderStopped)) => Err(InfinityError::ReaderStopped),
            Ok(Err(ReplyFailure::Disconnected)) => Err(InfinityError::Disconnected),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(shared) = waiter.shared.upgrade() {
                    shared.unregister(self.message_id, waiter.ticket);
                }
                Err(InfinityError::Timeout {
                    message_id: self.message_id,
                    timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(InfinityError::ReplyLost {
                message_id: self.message_id,
            }),
        }
    }
}

/// Owns the open device and the reader thread.
pub struct InfinityComms {
    shared: Arc<Shared>,
    info: HidDeviceInfo,
    reader: Option<JoinHandle<()>>,
}

impl InfinityComms {
    /// Open the configured base.
    ///
    /// # Errors
    /// [`InfinityError::DeviceOpen`] when a matching device is visible but
    /// could not be opened, [`InfinityError::DeviceNotFound`] otherwise.
    pub fn open(port: &dyn HidPort, config: &BaseConfig) -> InfinityResult<Self> {
        let (vendor_id, product_id) = (config.vendor_id, config.product_id);
        let opened = match config.path.as_deref() {
            Some(path) => port.open_path(path),
            None => port.open(vendor_id, product_id),
        };

        let transport = match opened {
            Ok(transport) => transport,
            Err(e) => {
                debug!(error = %e, "open failed, re-enumerating");
                return Err(if discover_bases(port, vendor_id, product_id).is_empty() {
                    InfinityError::DeviceNotFound {
                        vendor_id,
                        product_id,
                    }
                } else {
                    InfinityError::DeviceOpen {
                        reason: e.to_string(),
                    }
                });
            }
        };

        info!(
            "Connected to Disney Infinity base (VID={vendor_id:04x} PID={product_id:04x}) at {}",
            transport.device_info().path
        );
        Ok(Self::from_transport(transport, config.poll_interval()))
    }

    /// Wrap an already open transport. The reader is not running yet.
    pub fn from_transport(transport: Box<dyn HidTransport>, poll_interval: Duration) -> Self {
        let info = transport.device_info().clone();
        Self {
            shared: Arc::new(Shared {
                transport: Mutex::new(transport),
                pending: Mutex::new(HashMap::new()),
                message_number: Mutex::new(0),
                next_ticket: AtomicU64::new(0),
                observers: RwLock::new(Vec::new()),
                stop: AtomicBool::new(false),
                poll_interval,
            }),
            info,
            reader: None,
        }
    }

    /// Spawn the reader thread. Calling it again while running is a no-op.
    ///
    /// # Errors
    /// [`InfinityError::Spawn`] if the OS refuses to create the thread.
    pub fn start(&mut self) -> InfinityResult<()> {
        if self.reader.is_some() {
            return Ok(());
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("infinity-reader".to_string())
            .spawn(move || reader_loop(shared))
            .map_err(InfinityError::Spawn)?;
        self.reader = Some(handle);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.reader.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    /// Register a tag-change observer.
    ///
    /// Observers run on the reader thread: they must not block on a reply,
    /// since only the reader can deliver it.
    pub fn add_observer(&self, observer: Observer) {
        self.shared.observers.write().push(observer);
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Frame and write one command.
    ///
    /// # Errors
    /// [`InfinityError::Frame`] if the command does not fit one report,
    /// [`InfinityError::Write`] if the device rejects the write.
    pub fn send(&self, command: &Command) -> InfinityResult<PendingReply> {
        let message_id = self.shared.next_message_number();
        let frame = command.encode(message_id)?;

        let parked = command
            .expects_reply()
            .then(|| self.shared.register(message_id));

        let written = self.shared.transport.lock().write_report(&frame);
        if let Err(e) = written {
            if let Some((ticket, _)) = &parked {
                self.shared.unregister(message_id, *ticket);
            }
            return Err(InfinityError::Write(e));
        }
        trace!(message_id, command = command.code(), "sent command");

        Ok(PendingReply {
            message_id,
            waiter: parked.map(|(ticket, rx)| Waiter {
                ticket,
                rx,
                shared: Arc::downgrade(&self.shared),
            }),
        })
    }

    /// Stop the reader thread and fail every outstanding request.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("reader thread panicked");
            }
        }
        self.shared.fail_pending(ReplyFailure::ReaderStopped);
    }

    /// Stop the reader and close the device.
    pub fn close(&mut self) {
        self.stop();
        if let Err(e) = self.shared.transport.lock().close() {
            debug!(error = %e, "closing device failed");
        }
    }
}

impl Drop for InfinityComms {
    fn drop(&mut self) {
        self.close();
    }
}
