//! Platform LED commands

use anyhow::Result;
use infinity_base::InfinityBase;
use infinity_hid_protocol::{Color, PlatformId};
use tracing::debug;

use crate::commands::{ColorArgs, LedMode};
use crate::output;

pub fn execute(base: &InfinityBase, args: &ColorArgs, json: bool) -> Result<()> {
    let platform = PlatformId(args.platform);
    if platform.platform().is_none() {
        debug!(%platform, "platform outside the three known pads");
    }
    let color = Color::new(args.red, args.green, args.blue);

    match args.mode {
        LedMode::Set => base.set_color(platform, color)?,
        LedMode::Fade => base.fade_color(platform, color)?,
        LedMode::Flash => base.flash_color(platform, color)?,
    }

    output::print_color_applied(platform, color, args.mode, json);
    Ok(())
}
