//! Disney Infinity base USB vendor and product ID constants.
//!
//! The base was manufactured by PDP (Performance Designed Products), which
//! owns VID `0x0E6F`. The Wii / PlayStation 3 / PlayStation 4 / Wii U bases
//! share PID `0x0129` and speak the framed HID protocol implemented in this
//! crate.
//!
//! The Xbox 360 and Xbox One bases are different hardware and are not matched.

/// PDP (Performance Designed Products) USB Vendor ID.
pub const VENDOR_ID: u16 = 0x0E6F;

/// Disney Infinity base (Wii / PlayStation) product ID.
pub const PRODUCT_BASE: u16 = 0x0129;

/// Returns `true` if the VID/PID pair identifies a supported Infinity base.
pub fn is_infinity_base(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_BASE
}

/// Returns the product name for a known PID, or `None`.
pub fn product_name(pid: u16) -> Option<&'static str> {
    match pid {
        PRODUCT_BASE => Some("Disney Infinity Base"),
        _ => None,
    }
}
