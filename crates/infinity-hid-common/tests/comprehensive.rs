//! Integration tests for device info and the mock port.

use infinity_hid_common::mock::{MockHidPort, MockHidTransport};
use infinity_hid_common::{HidCommonError, HidDeviceInfo, HidPort, HidTransport};
use proptest::prelude::*;
use std::time::Duration;

#[test]
fn device_info_serializes_to_json() -> Result<(), serde_json::Error> {
    let info = HidDeviceInfo::new(0x0E6F, 0x0129, "/dev/hidraw3")
        .with_manufacturer("PDP")
        .with_product_name("Disney Infinity Base");
    let json = serde_json::to_value(&info)?;
    assert_eq!(json["vendor_id"], 0x0E6F);
    assert_eq!(json["product_id"], 0x0129);
    assert_eq!(json["path"], "/dev/hidraw3");
    assert_eq!(json["serial_number"], serde_json::Value::Null);

    let restored: HidDeviceInfo = serde_json::from_value(json)?;
    assert_eq!(restored, info);
    Ok(())
}

#[test]
fn opened_mock_shares_state_with_test_handle() -> Result<(), HidCommonError> {
    let handle = MockHidTransport::new(0x0E6F, 0x0129, "/dev/hidraw0");
    let port = MockHidPort::new().with_device(handle.clone());

    let mut opened = port.open(0x0E6F, 0x0129)?;
    opened.write_report(&[0x00, 0xFF])?;
    assert_eq!(handle.get_write_history(), vec![vec![0x00, 0xFF]]);

    handle.queue_read(vec![0xAB]);
    let mut buf = [0u8; 32];
    assert_eq!(opened.read_report(&mut buf, Duration::from_millis(50))?, 1);
    Ok(())
}

#[test]
fn closed_mock_rejects_io() -> Result<(), HidCommonError> {
    let port = MockHidPort::new().with_device(MockHidTransport::new(0x0E6F, 0x0129, "/dev/hidraw0"));
    let mut opened = port.open_path("/dev/hidraw0")?;
    opened.close()?;
    assert!(!opened.is_connected());
    assert!(matches!(
        opened.write_report(&[0x00]),
        Err(HidCommonError::Disconnected)
    ));
    Ok(())
}

#[test]
fn failing_enumeration_is_an_error() {
    let port = MockHidPort::new().failing_enumeration();
    assert!(matches!(
        port.list_devices(),
        Err(HidCommonError::Backend(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Without strings the display name is always the lowercase VID:PID pair.
    #[test]
    fn prop_display_name_falls_back_to_ids(vid in any::<u16>(), pid in any::<u16>()) {
        let info = HidDeviceInfo::new(vid, pid, "");
        prop_assert_eq!(info.display_name(), format!("{vid:04x}:{pid:04x}"));
    }

    /// matches() is exact equality on both IDs.
    #[test]
    fn prop_matches_is_exact(vid in any::<u16>(), pid in any::<u16>(), other in any::<u16>()) {
        let info = HidDeviceInfo::new(vid, pid, "");
        prop_assert!(info.matches(vid, pid));
        if other != pid {
            prop_assert!(!info.matches(vid, other));
        }
    }
}
