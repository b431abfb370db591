// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies
//
// Device Interface Lifecycle Tests
//
// TESTING LAYERS:
//
// Layer 1 (Unit Tests - No hardware required):
//   - Accessors before the first refresh
//   - Channel counts and special channel addressing
//   - Transactional refresh with malformed source data
//   - Idempotent refresh
//   - Hotplug-driven refresh through a sysfs handler
//   - Failed hotplug refresh keeps the committed table
//   - Concurrent readers during refresh
//
// All tests drive a scripted restriction source; no DPU is needed.
//
// RUN:
//   cargo test --test device_interface

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use dpucaps::backend::{FixedInterface, QueryInterface, RefreshHandler, RestrictionSource};
use dpucaps::capability::InterfaceState;
use dpucaps::fourcc::FourCC;
use dpucaps::interface::{DeviceInterface, DisplayDevice, SysfsEventHandler};
use dpucaps::restriction::{
    ChannelAttributes, ChannelEntry, ChannelRestriction, RestrictionError, RestrictionTable,
    SizeRange,
};
use dpucaps::Error;
use serial_test::serial;

struct Panel;

impl DisplayDevice for Panel {
    fn name(&self) -> &str {
        "panel0"
    }
}

/// Serves queued tables one per query; repeats the last one when drained.
struct ScriptedSource {
    tables: Mutex<VecDeque<RestrictionTable>>,
}

impl ScriptedSource {
    fn new(tables: impl IntoIterator<Item = RestrictionTable>) -> Self {
        Self {
            tables: Mutex::new(tables.into_iter().collect()),
        }
    }
}

impl RestrictionSource for ScriptedSource {
    fn query(&self) -> Result<RestrictionTable, Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.len() > 1 {
            Ok(tables.pop_front().unwrap())
        } else {
            tables
                .front()
                .cloned()
                .ok_or_else(|| Error::Source("no restriction data".into()))
        }
    }
}

fn channel(id: i32, attributes: ChannelAttributes) -> ChannelEntry {
    ChannelEntry::new(
        id,
        attributes,
        ChannelRestriction {
            src_w: SizeRange::new(16, 4096, 1).unwrap(),
            src_h: SizeRange::new(8, 4096, 1).unwrap(),
            formats: [FourCC::RGBA8888].into(),
            scale_down: 4,
            scale_up: 8,
            ..Default::default()
        },
    )
}

fn two_plus_one() -> RestrictionTable {
    RestrictionTable {
        version: 1,
        general: vec![
            channel(0, ChannelAttributes::AFBC),
            channel(1, ChannelAttributes::AFBC),
        ],
        special: vec![channel(10, ChannelAttributes::ROTATE)],
        ppc: 2,
        max_disp_freq: 800_000,
    }
}

fn bring_up<I: DeviceInterface>(mut iface: I) -> I {
    let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
    iface.init(&device);
    iface.post_init().unwrap();
    iface
}

// =============================================================================
// Layer 1: Unit Tests (No Hardware Required)
// =============================================================================

#[test]
fn test_accessors_before_refresh_are_empty() {
    let iface = bring_up(FixedInterface::new(two_plus_one()));
    assert_eq!(iface.state(), InterfaceState::PostInitialized);
    assert_eq!(iface.channel_count(), 0);
    assert_eq!(iface.special_channel_count(), 0);
    assert!(matches!(
        iface.special_channel_id(0),
        Err(Error::OutOfRange { index: 0, count: 0 })
    ));
}

#[test]
fn test_two_general_one_special() {
    let iface = bring_up(FixedInterface::new(two_plus_one()));
    iface.update_restrictions().unwrap();

    assert_eq!(iface.channel_count(), 2);
    assert_eq!(iface.special_channel_count(), 1);
    assert_eq!(iface.special_channel_id(0).unwrap(), 10);
    assert_eq!(
        iface.special_channel_attributes(0).unwrap(),
        ChannelAttributes::ROTATE
    );
}

#[test]
fn test_special_channel_index_boundary() {
    let iface = bring_up(FixedInterface::new(two_plus_one()));
    iface.update_restrictions().unwrap();

    let count = iface.special_channel_count();
    assert!(iface.special_channel_id(count - 1).is_ok());
    assert!(iface.special_channel_attributes(count - 1).is_ok());
    assert!(matches!(
        iface.special_channel_id(count),
        Err(Error::OutOfRange { index: 1, count: 1 })
    ));
    assert!(matches!(
        iface.special_channel_attributes(count),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn test_malformed_refresh_keeps_previous_table() {
    let mut bad = two_plus_one();
    bad.general.push(channel(2, ChannelAttributes::empty()));
    bad.general[2].restriction.formats.clear();

    let iface = bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
        bad,
    ])));
    iface.update_restrictions().unwrap();
    let before = iface.capability_info();

    let err = iface.update_restrictions().unwrap_err();
    assert!(matches!(
        err,
        Error::Malformed(RestrictionError::EmptyFormats { id: 2, .. })
    ));
    assert_eq!(iface.channel_count(), 2);
    assert_eq!(iface.special_channel_id(0).unwrap(), 10);
    assert_eq!(*iface.capability_info(), *before);
    assert_eq!(iface.state(), InterfaceState::RestrictionsReady);
}

#[test]
fn test_duplicate_id_is_malformed() {
    let mut bad = two_plus_one();
    bad.general[1].id = 0;
    let iface = bring_up(QueryInterface::new(ScriptedSource::new([bad])));
    assert!(matches!(
        iface.update_restrictions(),
        Err(Error::Malformed(RestrictionError::DuplicateId { id: 0, .. }))
    ));
    assert_eq!(iface.channel_count(), 0);
}

#[test]
fn test_refresh_replaces_instead_of_merging() {
    let mut smaller = two_plus_one();
    smaller.version = 2;
    smaller.general.truncate(1);
    smaller.special.clear();

    let iface = bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
        smaller.clone(),
    ])));
    iface.update_restrictions().unwrap();
    iface.update_restrictions().unwrap();

    assert_eq!(iface.capability_info().table(), &smaller);
    assert_eq!(iface.special_channel_count(), 0);
}

#[test]
fn test_identical_input_gives_identical_table() {
    let iface = bring_up(QueryInterface::new(ScriptedSource::new([two_plus_one()])));
    iface.update_restrictions().unwrap();
    let first = iface.capability_info();
    iface.update_restrictions().unwrap();
    let second = iface.capability_info();
    assert_eq!(first.table(), second.table());
    assert_eq!(first.features(), second.features());
}

#[test]
fn test_feature_table_follows_refresh() {
    let mut shared = two_plus_one();
    shared.general[0].attributes |= ChannelAttributes::HDR_COMM;
    shared.general[1].attributes |= ChannelAttributes::HDR_COMM;

    let iface = bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
        shared,
    ])));
    iface.update_restrictions().unwrap();
    assert!(!iface.capability_info().overlaps(0, 1));

    iface.update_restrictions().unwrap();
    let info = iface.capability_info();
    assert!(info.overlaps(0, 1));
    assert!(info.overlaps(1, 0));
    assert!(!info.overlaps(0, 2));
}

#[test]
#[should_panic(expected = "initialized twice")]
fn test_double_init_is_fatal() {
    let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
    let mut iface = FixedInterface::new(two_plus_one());
    iface.init(&device);
    iface.init(&device);
}

#[test]
#[should_panic(expected = "restrictions updated in state Initialized")]
fn test_refresh_before_post_init_is_fatal() {
    let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
    let mut iface = QueryInterface::new(ScriptedSource::new([two_plus_one()]));
    iface.init(&device);
    let _ = iface.update_restrictions();
}

#[test]
#[serial]
fn test_hotplug_refresh_through_sysfs_handler() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut grown = two_plus_one();
    grown.version = 2;
    grown.general.push(channel(2, ChannelAttributes::SCALE));

    let iface = Arc::new(bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
        grown,
    ]))));
    iface.update_restrictions().unwrap();

    let target: Arc<dyn DeviceInterface> = iface.clone();
    iface
        .register_sysfs_event_handler(Arc::new(RefreshHandler::new(42, &target)))
        .unwrap();
    assert!(matches!(
        iface.register_sysfs_event_handler(Arc::new(RefreshHandler::new(42, &target))),
        Err(Error::DuplicateHandler(42))
    ));

    // Stand-in for the external event loop seeing fd 42 become readable
    let handler = iface.sysfs_handler(42).unwrap();
    handler.handle_sysfs_event();
    assert_eq!(iface.channel_count(), 3);
    assert_eq!(iface.capability_info().table().version, 2);

    iface.unregister_sysfs_event_handler(42).unwrap();
}

#[test]
#[serial]
fn test_failed_hotplug_refresh_keeps_previous_table() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut broken = two_plus_one();
    broken.version = 3;
    broken.special.push(channel(10, ChannelAttributes::FLIP));

    let iface = Arc::new(bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
        broken,
    ]))));
    iface.update_restrictions().unwrap();
    let before = iface.capability_info();

    let target: Arc<dyn DeviceInterface> = iface.clone();
    iface
        .register_sysfs_event_handler(Arc::new(RefreshHandler::new(7, &target)))
        .unwrap();
    let handler = iface.sysfs_handler(7).unwrap();

    // The scripted source keeps serving the duplicate-id table
    for _ in 0..3 {
        handler.handle_sysfs_event();
        assert_eq!(iface.channel_count(), 2);
        assert_eq!(iface.special_channel_count(), 1);
        assert_eq!(iface.capability_info().table().version, 1);
        assert_eq!(*iface.capability_info(), *before);
        assert_eq!(iface.state(), InterfaceState::RestrictionsReady);
    }
}

#[test]
fn test_hotplug_after_interface_dropped_is_ignored() {
    let iface = Arc::new(bring_up(QueryInterface::new(ScriptedSource::new([
        two_plus_one(),
    ]))));
    let target: Arc<dyn DeviceInterface> = iface.clone();
    let handler = RefreshHandler::new(5, &target);
    drop(target);
    drop(iface);
    handler.handle_sysfs_event();
}

#[test]
#[serial]
fn test_readers_never_see_partial_tables() {
    let mut wide = two_plus_one();
    wide.version = 2;
    for id in 2..8 {
        wide.general.push(channel(id, ChannelAttributes::SCALE));
    }

    let mut script = Vec::new();
    for _ in 0..50 {
        script.push(two_plus_one());
        script.push(wide.clone());
    }

    let iface = Arc::new(bring_up(QueryInterface::new(ScriptedSource::new(script))));
    iface.update_restrictions().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let iface = iface.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let info = iface.capability_info();
                    let expected = match info.table().version {
                        1 => 2,
                        2 => 8,
                        v => panic!("unexpected version {}", v),
                    };
                    assert_eq!(info.channel_count(), expected);
                    assert_eq!(info.features().overlap().len(), expected);
                }
            })
        })
        .collect();

    for _ in 0..99 {
        iface.update_restrictions().unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }
}
