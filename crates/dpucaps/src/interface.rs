// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Device interface contract
//!
//! A [`DeviceInterface`] is how a display device learns what its DPU can do.
//! Each backend (live kernel query, static table, simulator) implements the
//! trait; the composition planner only ever talks to the trait.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --init--> Initialized --post_init--> PostInitialized
//!     --update_restrictions--> RestrictionsReady --update_restrictions--> ...
//! ```
//!
//! The owning device constructs the backend, calls [`init`] with itself,
//! performs any hardware setup, calls [`post_init`], then
//! [`update_restrictions`]. After that the interface may be shared across
//! threads: refreshes from a hotplug path and reads from the planning path
//! are serialized by the backend's [`CapabilityStore`].
//!
//! Calling `init` twice, or refreshing before `post_init`, is a sequencing
//! bug in the owning device and panics. Reading before the first refresh is
//! allowed and yields an empty table.
//!
//! [`init`]: DeviceInterface::init
//! [`post_init`]: DeviceInterface::post_init
//! [`update_restrictions`]: DeviceInterface::update_restrictions

use std::fmt;
use std::os::fd::RawFd;
use std::sync::Arc;

use crate::capability::{CapabilityReader, CapabilityStore, DeviceCapabilityInfo, InterfaceState};
use crate::restriction::ChannelAttributes;
use crate::Error;

/// The display device that owns a device interface.
///
/// The interface keeps only a weak back-reference to it.
pub trait DisplayDevice: Send + Sync {
    fn name(&self) -> &str;
}

/// Per-display rendering interface that may want access to the DPU
/// capabilities.
pub trait DisplayInterface {
    fn display_id(&self) -> u32;

    /// Receive a read handle on the device's committed capabilities.
    fn bind_capabilities(&mut self, caps: CapabilityReader) -> Result<(), Error>;
}

/// Subscriber to kernel sysfs change notifications (hotplug and similar).
pub trait SysfsEventHandler: Send + Sync {
    /// Descriptor the event loop polls for this handler
    fn sysfs_fd(&self) -> RawFd;

    fn handle_sysfs_event(&self);
}

/// Which kind of backend implements the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    None,
    /// Restrictions compiled in or supplied once at construction
    Fixed,
    /// Restrictions queried from a live source on every refresh
    Query,
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceType::None => write!(f, "none"),
            InterfaceType::Fixed => write!(f, "fixed"),
            InterfaceType::Query => write!(f, "query"),
        }
    }
}

/// Contract every DPU restriction backend satisfies
///
/// Only [`capabilities`](Self::capabilities),
/// [`capabilities_mut`](Self::capabilities_mut) and
/// [`update_restrictions`](Self::update_restrictions) must be written by a
/// backend; every other method has a default built on the
/// [`CapabilityStore`].
pub trait DeviceInterface: Send + Sync {
    /// Shared lifecycle and restriction state of this backend
    fn capabilities(&self) -> &CapabilityStore;

    fn capabilities_mut(&mut self) -> &mut CapabilityStore;

    /// Bind the interface to its owning device.
    ///
    /// # Panics
    ///
    /// If called more than once.
    fn init(&mut self, device: &Arc<dyn DisplayDevice>) {
        self.capabilities_mut().bind(device);
    }

    /// Backend setup that needs the device binding.
    ///
    /// # Panics
    ///
    /// If `init` has not been called, or `post_init` was already called.
    fn post_init(&mut self) -> Result<(), Error> {
        self.capabilities_mut().finish_post_init();
        Ok(())
    }

    /// Wire a per-display interface to this device interface. Backends with
    /// nothing to share keep the default no-op.
    fn init_display_interface(&mut self, _display: &mut dyn DisplayInterface) -> Result<(), Error> {
        Ok(())
    }

    /// Load restrictions from the backend's authoritative source and commit
    /// them through [`CapabilityStore::make_dpu_restrictions`].
    ///
    /// Each successful call replaces the previous table. A failed call leaves
    /// the previous table in effect.
    fn update_restrictions(&self) -> Result<(), Error>;

    fn interface_type(&self) -> InterfaceType {
        InterfaceType::None
    }

    /// Whether restrictions come from a live hardware query, making an
    /// opportunistic refresh worthwhile.
    fn use_query(&self) -> bool {
        self.capabilities().use_query()
    }

    fn register_sysfs_event_handler(
        &self,
        _handler: Arc<dyn SysfsEventHandler>,
    ) -> Result<(), Error> {
        Err(Error::Unsupported("register_sysfs_event_handler"))
    }

    fn unregister_sysfs_event_handler(&self, _fd: RawFd) -> Result<(), Error> {
        Err(Error::Unsupported("unregister_sysfs_event_handler"))
    }

    /// Owning device, if it is still alive
    fn device(&self) -> Option<Arc<dyn DisplayDevice>> {
        self.capabilities().device()
    }

    fn state(&self) -> InterfaceState {
        self.capabilities().state()
    }

    /// Snapshot of the committed restriction and feature tables
    fn capability_info(&self) -> Arc<DeviceCapabilityInfo> {
        self.capabilities().snapshot()
    }

    /// Number of general composition channels
    fn channel_count(&self) -> usize {
        self.capability_info().channel_count()
    }

    /// Number of special purpose channels
    fn special_channel_count(&self) -> usize {
        self.capability_info().special_channel_count()
    }

    /// Hardware id of the special channel at `index`
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index >= special_channel_count()`.
    fn special_channel_id(&self, index: usize) -> Result<i32, Error> {
        Ok(self.capability_info().special_channel(index)?.id)
    }

    /// Attributes of the special channel at `index`
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index >= special_channel_count()`.
    fn special_channel_attributes(&self, index: usize) -> Result<ChannelAttributes, Error> {
        Ok(self.capability_info().special_channel(index)?.attributes)
    }
}
