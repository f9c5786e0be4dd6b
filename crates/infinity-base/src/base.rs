//! High-level API for the Disney Infinity base.

use crate::comms::InfinityComms;
use crate::config::BaseConfig;
use crate::error::{InfinityError, InfinityResult};
use crossbeam::channel::{self, Receiver, Sender};
use infinity_hid_common::{HidApiPort, HidDeviceInfo, HidPort};
use infinity_hid_protocol::{Color, Command, PlatformId, TagSlot, parse_tag_index};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw tag payloads grouped by the platform they sit on.
pub type TagsByPlatform = BTreeMap<u8, Vec<Vec<u8>>>;

type TagsCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseEvent {
    /// A figure or disc was placed on or lifted off the base.
    TagsChanged { raw: Vec<u8> },
}

#[derive(Default)]
struct Listeners {
    callbacks: RwLock<Vec<TagsCallback>>,
    subscribers: Mutex<Vec<Sender<BaseEvent>>>,
}

impl Listeners {
    fn notify(&self, raw: &[u8]) {
        let callbacks: Vec<TagsCallback> = self.callbacks.read().clone();
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!("tags-changed callback panicked");
            }
        }

        let event = BaseEvent::TagsChanged { raw: raw.to_vec() };
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A Disney Infinity base.
///
/// ```no_run
/// use infinity_base::{BaseConfig, InfinityBase};
/// use infinity_hid_protocol::{Color, Platform};
///
/// # fn main() -> Result<(), infinity_base::InfinityError> {
/// let mut base = InfinityBase::new(BaseConfig::default())?;
/// base.connect()?;
/// println!("{:?}", base.get_all_tags()?);
/// base.set_color(Platform::Hexagon, Color::new(200, 0, 0))?;
/// # Ok(())
/// # }
/// ```
pub struct InfinityBase {
    config: BaseConfig,
    port: Arc<dyn HidPort>,
    comms: Option<InfinityComms>,
    listeners: Arc<Listeners>,
}

impl InfinityBase {
    /// Create a base backed by `hidapi`. Nothing is opened until [`connect`](Self::connect).
    ///
    /// # Errors
    /// Fails when the HID library cannot be initialised.
    pub fn new(config: BaseConfig) -> InfinityResult<Self> {
        let port = HidApiPort::new()?;
        Ok(Self::with_port(config, Arc::new(port)))
    }

    pub fn with_port(config: BaseConfig, port: Arc<dyn HidPort>) -> Self {
        Self {
            config,
            port,
            comms: None,
            listeners: Arc::new(Listeners::default()),
        }
    }

    pub fn config(&self) -> &BaseConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.comms.as_ref().is_some_and(InfinityComms::is_running)
    }

    pub fn device_info(&self) -> Option<&HidDeviceInfo> {
        self.comms.as_ref().map(InfinityComms::device_info)
    }

    /// Open the device, start the reader and activate the base.
    ///
    /// Connecting an already connected base does nothing; a base whose reader
    /// stopped after an unplug is reopened.
    ///
    /// # Errors
    /// See [`InfinityComms::open`]; also fails if activation cannot be written.
    pub fn connect(&mut self) -> InfinityResult<&mut Self> {
        if self.is_connected() {
            return Ok(self);
        }
        // a reader that died on unplug leaves stale comms behind
        self.disconnect();

        let mut comms = InfinityComms::open(self.port.as_ref(), &self.config)?;
        let listeners = Arc::clone(&self.listeners);
        comms.add_observer(Arc::new(move |raw: &[u8]| listeners.notify(raw)));
        comms.start()?;
        self.comms = Some(comms);

        if let Err(e) = self.activate() {
            warn!(error = %e, "activation failed");
            self.disconnect();
            return Err(e);
        }
        Ok(self)
    }

    /// Stop the reader and close the device. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(mut comms) = self.comms.take() {
            comms.close();
            debug!("disconnected from base");
        }
    }

    /// Run `callback` whenever tags are added or removed.
    ///
    /// Callbacks run on the reader thread and must not wait for replies from
    /// the base; use [`subscribe`](Self::subscribe) to react with queries.
    pub fn on_tags_changed<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.callbacks.write().push(Arc::new(callback));
    }

    /// Receive tag-change events on a channel.
    pub fn subscribe(&self) -> Receiver<BaseEvent> {
        let (tx, rx) = channel::unbounded();
        self.listeners.subscribers.lock().push(tx);
        rx
    }

    fn comms(&self) -> InfinityResult<&InfinityComms> {
        self.comms.as_ref().ok_or(InfinityError::NotConnected)
    }

    /// Send a command and wait for its reply payload.
    ///
    /// # Errors
    /// [`InfinityError::NotConnected`], write failures, or the reply errors of
    /// [`PendingReply::wait`](crate::PendingReply::wait).
    pub fn call(&self, command: &Command) -> InfinityResult<Vec<u8>> {
        self.comms()?
            .send(command)?
            .wait(self.config.reply_timeout())
    }

    /// Send a command without waiting for a reply.
    ///
    /// # Errors
    /// [`InfinityError::NotConnected`] or write failures.
    pub fn send(&self, command: &Command) -> InfinityResult<()> {
        let pending = self.comms()?.send(command)?;
        debug!(message_id = pending.message_id(), "command sent");
        Ok(())
    }

    /// # Errors
    /// [`InfinityError::NotConnected`] or write failures.
    pub fn activate(&self) -> InfinityResult<()> {
        self.send(&Command::Activate)
    }

    /// Which tags are present and on which platform.
    ///
    /// # Errors
    /// See [`call`](Self::call).
    pub fn get_tag_index(&self) -> InfinityResult<Vec<TagSlot>> {
        let payload = self.call(&Command::GetTagIndex)?;
        Ok(parse_tag_index(&payload))
    }

    /// Raw data of the tag at `index`.
    ///
    /// # Errors
    /// See [`call`](Self::call).
    pub fn get_tag(&self, index: u8) -> InfinityResult<Vec<u8>> {
        self.call(&Command::GetTag { index })
    }

    /// Every tag on the base grouped by platform, in tag index order.
    ///
    /// # Errors
    /// See [`call`](Self::call).
    pub fn get_all_tags(&self) -> InfinityResult<TagsByPlatform> {
        let mut tags = TagsByPlatform::new();
        for slot in self.get_tag_index()? {
            let data = self.get_tag(slot.index)?;
            tags.entry(slot.platform).or_default().push(data);
        }
        Ok(tags)
    }

    /// # Errors
    /// [`InfinityError::NotConnected`] or write failures.
    pub fn set_color(
        &self,
        platform: impl Into<PlatformId>,
        color: impl Into<Color>,
    ) -> InfinityResult<()> {
        self.send(&Command::SetColor {
            platform: platform.into(),
            color: color.into(),
        })
    }

    /// # Errors
    /// [`InfinityError::NotConnected`] or write failures.
    pub fn fade_color(
        &self,
        platform: impl Into<PlatformId>,
        color: impl Into<Color>,
    ) -> InfinityResult<()> {
        self.send(&Command::FadeColor {
            platform: platform.into(),
            color: color.into(),
        })
    }

    /// # Errors
    /// [`InfinityError::NotConnected`] or write failures.
    pub fn flash_color(
        &self,
        platform: impl Into<PlatformId>,
        color: impl Into<Color>,
    ) -> InfinityResult<()> {
        self.send(&Command::FlashColor {
            platform: platform.into(),
            color: color.into(),
        })
    }
}

impl Drop for InfinityBase {
    fn drop(&mut self) {
        self.disconnect();
    }
}
