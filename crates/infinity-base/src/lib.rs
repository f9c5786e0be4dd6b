//! Driver for the Disney Infinity USB base.
//!
//! [`InfinityBase`] opens the base through `hidapi`, runs a background reader
//! thread and exposes blocking calls for reading the figures on the base and
//! driving the platform LEDs:
//!
//! ```no_run
//! use infinity_base::{BaseConfig, InfinityBase};
//! use infinity_hid_protocol::Color;
//!
//! # fn main() -> Result<(), infinity_base::InfinityError> {
//! let mut base = InfinityBase::new(BaseConfig::default())?;
//! base.connect()?;
//! base.on_tags_changed(|| println!("Tags added or removed."));
//! base.fade_color(3u8, Color::new(0, 0, 200))?;
//! # Ok(())
//! # }
//! ```
//!
//! On Linux the `/dev/hidraw*` node needs a udev rule before a regular user
//! can open it; see [`udev`].

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod base;
pub mod comms;
pub mod config;
pub mod discovery;
pub mod error;
pub mod udev;

pub use base::{BaseEvent, InfinityBase, TagsByPlatform};
pub use comms::{InfinityComms, Observer, PendingReply};
pub use config::{BaseConfig, ConfigError};
pub use discovery::discover_bases;
pub use error::{InfinityError, InfinityResult};
