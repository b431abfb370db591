// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::capability::CapabilityStore;
use crate::interface::{DeviceInterface, InterfaceType};
use crate::restriction::RestrictionTable;
use crate::Error;

/// Backend serving a restriction table fixed at construction
///
/// Used for DPUs without a restriction query, where the table is compiled
/// into the product configuration, and as a simulated backend in tests.
/// Every refresh recommits the same table, so repeated refreshes produce
/// identical results.
#[derive(Debug)]
pub struct FixedInterface {
    caps: CapabilityStore,
    table: RestrictionTable,
}

impl FixedInterface {
    pub fn new(table: RestrictionTable) -> Self {
        Self::with_min_version(table, 0)
    }

    /// Like [`new`](Self::new) but rejecting tables older than `min_version`.
    pub fn with_min_version(table: RestrictionTable, min_version: u32) -> Self {
        Self {
            caps: CapabilityStore::new(false, min_version),
            table,
        }
    }

    /// Table that the next refresh will commit
    pub fn table(&self) -> &RestrictionTable {
        &self.table
    }
}

impl DeviceInterface for FixedInterface {
    fn capabilities(&self) -> &CapabilityStore {
        &self.caps
    }

    fn capabilities_mut(&mut self) -> &mut CapabilityStore {
        &mut self.caps
    }

    fn update_restrictions(&self) -> Result<(), Error> {
        self.caps.make_dpu_restrictions(self.table.clone())
    }

    fn interface_type(&self) -> InterfaceType {
        InterfaceType::Fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityReader, InterfaceState};
    use crate::fourcc::FourCC;
    use crate::interface::{DisplayDevice, DisplayInterface, SysfsEventHandler};
    use crate::restriction::{ChannelAttributes, ChannelEntry, ChannelRestriction};
    use std::os::fd::RawFd;
    use std::sync::Arc;

    struct Panel;

    impl DisplayDevice for Panel {
        fn name(&self) -> &str {
            "panel"
        }
    }

    struct NoopHandler;

    impl SysfsEventHandler for NoopHandler {
        fn sysfs_fd(&self) -> RawFd {
            9
        }

        fn handle_sysfs_event(&self) {}
    }

    struct Display {
        bound: bool,
    }

    impl DisplayInterface for Display {
        fn display_id(&self) -> u32 {
            0
        }

        fn bind_capabilities(&mut self, _caps: CapabilityReader) -> Result<(), Error> {
            self.bound = true;
            Ok(())
        }
    }

    fn table() -> RestrictionTable {
        RestrictionTable {
            version: 1,
            general: vec![ChannelEntry::new(
                0,
                ChannelAttributes::empty(),
                ChannelRestriction {
                    formats: [FourCC::ARGB8888].into(),
                    ..Default::default()
                },
            )],
            ..Default::default()
        }
    }

    fn ready() -> FixedInterface {
        let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
        let mut iface = FixedInterface::new(table());
        iface.init(&device);
        iface.post_init().unwrap();
        iface
    }

    #[test]
    fn test_defaults() {
        let mut iface = ready();
        assert!(!iface.use_query());
        assert_eq!(iface.interface_type(), InterfaceType::Fixed);
        assert!(matches!(
            iface.register_sysfs_event_handler(Arc::new(NoopHandler)),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            iface.unregister_sysfs_event_handler(9),
            Err(Error::Unsupported(_))
        ));

        let mut display = Display { bound: false };
        iface.init_display_interface(&mut display).unwrap();
        assert!(!display.bound);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let iface = ready();
        iface.update_restrictions().unwrap();
        let first = iface.capability_info();
        iface.update_restrictions().unwrap();
        let second = iface.capability_info();
        assert_eq!(first.table(), second.table());
        assert_eq!(first, second);
        assert_eq!(iface.state(), InterfaceState::RestrictionsReady);
    }

    #[test]
    fn test_min_version_rejects() {
        let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
        let mut iface = FixedInterface::with_min_version(table(), 2);
        iface.init(&device);
        iface.post_init().unwrap();
        assert!(matches!(
            iface.update_restrictions(),
            Err(Error::Malformed(_))
        ));
        assert_eq!(iface.channel_count(), 0);
        assert_eq!(iface.state(), InterfaceState::PostInitialized);
    }

    #[test]
    #[should_panic(expected = "post_init called in state Uninitialized")]
    fn test_post_init_before_init_panics() {
        let mut iface = FixedInterface::new(table());
        let _ = iface.post_init();
    }
}
