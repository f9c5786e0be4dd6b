//! End-to-end behaviour of [`InfinityBase`] against a scripted base.

use infinity_base::{BaseConfig, BaseEvent, InfinityBase, InfinityError};
use infinity_hid_common::mock::{MockHidPort, MockHidTransport};
use infinity_hid_protocol::{Color, PRODUCT_BASE, Platform, TagSlot, VENDOR_ID};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(2);

fn fast_config() -> BaseConfig {
    BaseConfig {
        poll_interval_ms: 5,
        reply_timeout_ms: 2000,
        ..BaseConfig::default()
    }
}

/// Answers tag queries like a base holding a tag on the hexagon (index 0)
/// and one on player 1 (index 1).
fn scripted_base() -> MockHidTransport {
    let device = MockHidTransport::new(VENDOR_ID, PRODUCT_BASE, "/dev/hidraw3")
        .with_product_name("Disney Infinity Base");
    device.respond_with(|frame| match frame[3] {
        0xA1 => vec![vec![0xAA, 0x04, frame[4], 0x10, 0x21, 0x09]],
        0xB4 => {
            let index = frame[5];
            vec![vec![0xAA, 0x04, frame[4], 0xD0 + index, 0x01, 0x02]]
        }
        _ => Vec::new(),
    });
    device
}

fn base_over(device: &MockHidTransport) -> InfinityBase {
    let port = MockHidPort::new().with_device(device.clone());
    InfinityBase::with_port(fast_config(), Arc::new(port))
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn given_base_when_connecting_then_activation_is_first_write() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);

    base.connect()?;

    assert!(base.is_connected());
    let history = device.get_write_history();
    assert_eq!(history.len(), 1);
    assert_eq!(&history[0][..5], &[0x00, 0xFF, 0x11, 0x80, 0x01]);
    assert_eq!(&history[0][5..20], b"(c) Disney 2013");
    assert_eq!(
        base.device_info().map(|info| info.path.as_str()),
        Some("/dev/hidraw3")
    );
    Ok(())
}

#[test]
fn given_connected_base_when_connecting_again_then_nothing_is_sent() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);

    base.connect()?.connect()?;
    assert_eq!(device.get_write_history().len(), 1);
    Ok(())
}

#[test]
fn given_two_tags_when_reading_index_then_slots_are_decoded() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    base.connect()?;

    let slots = base.get_tag_index()?;
    assert_eq!(
        slots,
        vec![
            TagSlot {
                platform: 1,
                index: 0
            },
            TagSlot {
                platform: 2,
                index: 1
            },
        ]
    );
    Ok(())
}

#[test]
fn given_two_tags_when_reading_all_then_grouped_by_platform() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    base.connect()?;

    let tags = base.get_all_tags()?;
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get(&1), Some(&vec![vec![0xD0, 0x01, 0x02]]));
    assert_eq!(tags.get(&2), Some(&vec![vec![0xD1, 0x01, 0x02]]));

    let tag_queries: Vec<u8> = device
        .get_write_history()
        .iter()
        .filter(|frame| frame[3] == 0xB4)
        .map(|frame| frame[5])
        .collect();
    assert_eq!(tag_queries, vec![0, 1]);
    Ok(())
}

#[test]
fn given_empty_base_when_reading_all_then_empty_map() -> Result<(), InfinityError> {
    let device = MockHidTransport::new(VENDOR_ID, PRODUCT_BASE, "/dev/hidraw3");
    device.respond_with(|frame| match frame[3] {
        0xA1 => vec![vec![0xAA, 0x01, frame[4]]],
        _ => Vec::new(),
    });
    let mut base = base_over(&device);
    base.connect()?;

    assert!(base.get_all_tags()?.is_empty());
    Ok(())
}

#[test]
fn given_connected_base_when_driving_leds_then_frames_match_layout() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    base.connect()?;

    base.set_color(Platform::Hexagon, Color::new(200, 0, 0))?;
    base.fade_color(Platform::Player2, Color::new(0, 0, 200))?;
    base.flash_color(3u8, Color::new(0, 0, 200))?;

    let history = device.get_write_history();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|frame| frame.len() == 33));

    assert_eq!(&history[1][..10], &[0x00, 0xFF, 0x06, 0x90, 0x02, 0x01, 200, 0, 0, 0x60]);
    assert_eq!(&history[2][3..12], &[0x92, 0x03, 0x03, 0x10, 0x02, 0, 0, 200, 0x79]);
    assert_eq!(
        &history[3][3..13],
        &[0x93, 0x04, 0x03, 0x02, 0x02, 0x06, 0, 0, 200, 0x74]
    );
    Ok(())
}

#[test]
fn given_unconnected_base_when_calling_then_not_connected() {
    let device = scripted_base();
    let base = base_over(&device);

    assert!(!base.is_connected());
    assert!(matches!(
        base.set_color(1u8, Color::WHITE),
        Err(InfinityError::NotConnected)
    ));
    assert!(matches!(base.get_tag_index(), Err(InfinityError::NotConnected)));
    assert!(device.get_write_history().is_empty());
}

#[test]
fn given_no_device_when_connecting_then_not_found() {
    let port = MockHidPort::new().with_device(MockHidTransport::new(0x046D, 0xC294, "/dev/hidraw0"));
    let mut base = InfinityBase::with_port(fast_config(), Arc::new(port));

    let err = base.connect().err();
    assert!(matches!(
        err,
        Some(InfinityError::DeviceNotFound {
            vendor_id: 0x0E6F,
            product_id: 0x0129
        })
    ));
    assert!(!base.is_connected());
}

#[test]
fn given_unopenable_device_when_connecting_then_open_error_mentions_udev() {
    let device = scripted_base();
    device.set_deny_open(true);
    let mut base = base_over(&device);

    match base.connect() {
        Err(err @ InfinityError::DeviceOpen { .. }) => {
            let message = err.to_string();
            assert!(message.contains("permission denied"));
            assert!(message.contains("/etc/udev/rules.d/99-disney-infinity.rules"));
        }
        Err(other) => panic!("expected DeviceOpen, got {other:?}"),
        Ok(_) => panic!("expected DeviceOpen, connected instead"),
    }
}

#[test]
fn given_configured_path_when_connecting_then_that_device_opens() -> Result<(), InfinityError> {
    let first = scripted_base();
    let second = MockHidTransport::new(VENDOR_ID, PRODUCT_BASE, "/dev/hidraw7");
    let port = MockHidPort::new()
        .with_device(first.clone())
        .with_device(second.clone());
    let config = BaseConfig {
        path: Some("/dev/hidraw7".to_string()),
        ..fast_config()
    };
    let mut base = InfinityBase::with_port(config, Arc::new(port));

    base.connect()?;
    assert!(first.get_write_history().is_empty());
    assert_eq!(second.get_write_history().len(), 1);
    Ok(())
}

#[test]
fn given_write_failure_during_activation_then_connect_fails_cleanly() {
    let device = scripted_base();
    device.set_fail_writes(true);
    let mut base = base_over(&device);

    assert!(matches!(base.connect(), Err(InfinityError::Write(_))));
    assert!(!base.is_connected());
    assert!(base.device_info().is_none());
}

#[test]
fn given_tag_change_when_notified_then_callbacks_and_subscribers_fire() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    base.on_tags_changed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let events = base.subscribe();
    base.connect()?;

    device.queue_read(vec![0xAB, 0x04, 0x01, 0x09, 0x00, 0x00]);

    let event = events.recv_timeout(WAIT).ok();
    assert_eq!(
        event,
        Some(BaseEvent::TagsChanged {
            raw: vec![0xAB, 0x04, 0x01, 0x09, 0x00, 0x00]
        })
    );
    assert!(wait_until(|| hits.load(Ordering::SeqCst) == 1));
    Ok(())
}

#[test]
fn given_dropped_subscriber_when_notified_then_others_still_receive() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    drop(base.subscribe());
    let events = base.subscribe();
    base.connect()?;

    device.queue_read(vec![0xAB, 0x01]);
    assert!(events.recv_timeout(WAIT).is_ok());
    Ok(())
}

#[test]
fn given_connected_base_when_disconnecting_twice_then_no_panic() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    base.connect()?;

    base.disconnect();
    base.disconnect();
    assert!(!base.is_connected());
    assert!(matches!(base.get_tag(0), Err(InfinityError::NotConnected)));
    Ok(())
}

#[test]
fn given_unplugged_base_when_reconnecting_then_device_reopens() -> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    base.connect()?;

    device.disconnect();
    assert!(wait_until(|| !base.is_connected()));

    base.connect()?;
    assert!(base.is_connected());
    let activations = device
        .get_write_history()
        .iter()
        .filter(|frame| frame[3] == 0x80)
        .count();
    assert_eq!(activations, 2);
    assert_eq!(base.get_tag_index()?.len(), 2);
    Ok(())
}

#[test]
fn given_silent_base_when_querying_then_timeout() -> Result<(), InfinityError> {
    let device = MockHidTransport::new(VENDOR_ID, PRODUCT_BASE, "/dev/hidraw3");
    let port = MockHidPort::new().with_device(device);
    let config = BaseConfig {
        reply_timeout_ms: 30,
        ..fast_config()
    };
    let mut base = InfinityBase::with_port(config, Arc::new(port));
    base.connect()?;

    assert!(matches!(
        base.get_tag_index(),
        Err(InfinityError::Timeout { .. })
    ));
    assert!(base.is_connected());
    Ok(())
}

#[test]
fn given_panicking_callback_when_tags_change_then_later_listeners_still_run()
-> Result<(), InfinityError> {
    let device = scripted_base();
    let mut base = base_over(&device);
    let hits = Arc::new(AtomicUsize::new(0));

    base.on_tags_changed(|| panic!("callback failure"));
    let counter = Arc::clone(&hits);
    base.on_tags_changed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let events = base.subscribe();
    base.connect()?;

    device.queue_read(vec![0xAB, 0x01]);

    assert_eq!(
        events.recv_timeout(WAIT).ok(),
        Some(BaseEvent::TagsChanged {
            raw: vec![0xAB, 0x01]
        })
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    device.queue_read(vec![0xAB, 0x02]);
    assert!(events.recv_timeout(WAIT).is_ok());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(base.is_connected());
    Ok(())
}
