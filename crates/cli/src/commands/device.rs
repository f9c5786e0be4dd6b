//! Base listing, tag reading and tag watching

use anyhow::{Context, Result};
use infinity_base::{BaseConfig, BaseEvent, InfinityBase, InfinityError, discover_bases};
use infinity_hid_common::HidPort;
use std::time::Duration;
use tokio::time::interval;
use tracing::warn;

use crate::output;

const WATCH_POLL: Duration = Duration::from_millis(50);

/// List connected bases
pub fn list(port: &dyn HidPort, config: &BaseConfig, json: bool) -> Result<()> {
    let bases = discover_bases(port, config.vendor_id, config.product_id);
    output::print_base_list(&bases, json);
    Ok(())
}

/// Print every tag on the base
pub fn tags(base: &InfinityBase, json: bool) -> Result<()> {
    let tags = base.get_all_tags().context("Failed to read tags")?;
    output::print_tags(&tags, json);
    Ok(())
}

/// Print a line per tag change until Ctrl+C or until the base goes away
pub async fn watch(base: &InfinityBase, json: bool) -> Result<()> {
    let events = base.subscribe();
    if !json {
        println!("Try adding/removing figures/discs to/from the base. Press Ctrl+C to quit");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interval = interval(WATCH_POLL);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                return Ok(());
            }
            _ = interval.tick() => {
                while let Ok(BaseEvent::TagsChanged { raw }) = events.try_recv() {
                    let tags = tokio::task::block_in_place(|| base.get_all_tags());
                    match tags {
                        Ok(tags) => output::print_tags_changed(&raw, Some(&tags), json),
                        Err(e) => {
                            warn!(error = %e, "could not re-read tags after change");
                            output::print_tags_changed(&raw, None, json);
                            output::print_warning(&format!("Could not read tags: {e}"), json);
                        }
                    }
                }
                if !base.is_connected() {
                    return Err(InfinityError::Disconnected.into());
                }
            }
        }
    }
}
