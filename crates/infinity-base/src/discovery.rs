//! Base discovery.

use infinity_hid_common::{HidDeviceInfo, HidPort};
use std::collections::HashSet;
use tracing::{debug, warn};

/// List connected devices matching the VID/PID pair.
///
/// Best effort: an enumeration failure is logged and yields an empty list.
pub fn discover_bases(port: &dyn HidPort, vendor_id: u16, product_id: u16) -> Vec<HidDeviceInfo> {
    let devices = match port.list_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!(error = %e, "HID enumeration failed");
            return Vec::new();
        }
    };

    // hidapi can list one physical base once per interface
    let mut seen = HashSet::new();
    let bases: Vec<HidDeviceInfo> = devices
        .into_iter()
        .filter(|d| d.matches(vendor_id, product_id))
        .filter(|d| seen.insert(d.path.clone()))
        .collect();
    debug!(count = bases.len(), "discovered Infinity bases");
    bases
}
