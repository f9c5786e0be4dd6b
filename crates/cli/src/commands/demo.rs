//! Walk-through of the base: tags, the three LED effects, then tag watching

use anyhow::Result;
use infinity_base::{BaseConfig, discover_bases};
use infinity_hid_common::HidPort;
use infinity_hid_protocol::{Color, Platform};
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{self, device};
use crate::output;

/// Long enough for the fade on the third platform to finish.
const FADE_PAUSE: Duration = Duration::from_secs(3);

const RED: Color = Color::new(200, 0, 0);
const GREEN: Color = Color::new(0, 56, 0);
const BLUE: Color = Color::new(0, 0, 200);

pub async fn run(port: Arc<dyn HidPort>, config: &BaseConfig, json: bool) -> Result<()> {
    let bases = discover_bases(port.as_ref(), config.vendor_id, config.product_id);
    output::print_base_list(&bases, json);

    let mut base = commands::connect(config, port)?;
    device::tags(&base, json)?;

    base.set_color(Platform::Hexagon, RED)?;
    base.set_color(Platform::Player1, GREEN)?;
    base.fade_color(Platform::Player2, BLUE)?;

    tokio::time::sleep(FADE_PAUSE).await;
    base.flash_color(Platform::Player2, BLUE)?;

    let watched = device::watch(&base, json).await;
    base.disconnect();
    watched
}
