// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::collections::BTreeMap;
use std::fmt;
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::capability::CapabilityStore;
use crate::interface::{DeviceInterface, DisplayInterface, InterfaceType, SysfsEventHandler};
use crate::restriction::RestrictionTable;
use crate::Error;

/// Authoritative origin of restriction data for a [`QueryInterface`]
///
/// Implemented by whatever can describe the DPU: a kernel driver property
/// blob, a register dump, a description file, a test script.
pub trait RestrictionSource: Send + Sync {
    /// Acquire whatever handle [`query`](Self::query) needs. Called once from
    /// `post_init`.
    fn open(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Read the current restrictions. Must be bounded and synchronous.
    fn query(&self) -> Result<RestrictionTable, Error>;

    /// Oldest restriction version this source's consumer understands
    fn min_version(&self) -> u32 {
        0
    }
}

/// Backend that queries a [`RestrictionSource`] on every refresh
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dpucaps::backend::{QueryInterface, RestrictionSource};
/// use dpucaps::interface::{DeviceInterface, DisplayDevice};
/// use dpucaps::restriction::RestrictionTable;
///
/// struct Blob;
///
/// impl RestrictionSource for Blob {
///     fn query(&self) -> Result<RestrictionTable, dpucaps::Error> {
///         Ok(RestrictionTable { version: 3, ..Default::default() })
///     }
/// }
///
/// struct Panel;
///
/// impl DisplayDevice for Panel {
///     fn name(&self) -> &str {
///         "panel0"
///     }
/// }
///
/// let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
/// let mut iface = QueryInterface::new(Blob);
/// iface.init(&device);
/// iface.post_init()?;
/// iface.update_restrictions()?;
/// assert!(iface.use_query());
/// assert_eq!(iface.capability_info().table().version, 3);
/// # Ok::<(), dpucaps::Error>(())
/// ```
pub struct QueryInterface<S> {
    caps: CapabilityStore,
    source: S,
    handlers: Mutex<BTreeMap<RawFd, Arc<dyn SysfsEventHandler>>>,
}

impl<S: RestrictionSource> QueryInterface<S> {
    pub fn new(source: S) -> Self {
        let min_version = source.min_version();
        Self {
            caps: CapabilityStore::new(true, min_version),
            source,
            handlers: Mutex::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Handler registered for `fd`, for the external event loop to dispatch to
    pub fn sysfs_handler(&self, fd: RawFd) -> Option<Arc<dyn SysfsEventHandler>> {
        self.handlers().get(&fd).cloned()
    }

    /// Descriptors with a registered handler
    pub fn sysfs_fds(&self) -> Vec<RawFd> {
        self.handlers().keys().copied().collect()
    }
}

impl<S> QueryInterface<S> {
    fn handlers(&self) -> MutexGuard<'_, BTreeMap<RawFd, Arc<dyn SysfsEventHandler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: RestrictionSource> DeviceInterface for QueryInterface<S> {
    fn capabilities(&self) -> &CapabilityStore {
        &self.caps
    }

    fn capabilities_mut(&mut self) -> &mut CapabilityStore {
        &mut self.caps
    }

    fn post_init(&mut self) -> Result<(), Error> {
        self.caps.assert_initialized();
        self.source.open()?;
        self.caps.finish_post_init();
        Ok(())
    }

    fn init_display_interface(
        &mut self,
        display: &mut dyn DisplayInterface,
    ) -> Result<(), Error> {
        log::debug!(
            "sharing DPU capabilities with display {}",
            display.display_id()
        );
        display.bind_capabilities(self.caps.reader())
    }

    fn update_restrictions(&self) -> Result<(), Error> {
        self.caps.assert_post_initialized();
        let table = self.source.query().map_err(|err| {
            log::error!("failed to query DPU restrictions: {}", err);
            err
        })?;
        self.caps.make_dpu_restrictions(table)
    }

    fn interface_type(&self) -> InterfaceType {
        InterfaceType::Query
    }

    fn register_sysfs_event_handler(
        &self,
        handler: Arc<dyn SysfsEventHandler>,
    ) -> Result<(), Error> {
        let fd = handler.sysfs_fd();
        let mut handlers = self.handlers();
        if handlers.contains_key(&fd) {
            log::warn!("sysfs handler for fd {} already registered", fd);
            return Err(Error::DuplicateHandler(fd));
        }
        handlers.insert(fd, handler);
        log::debug!("registered sysfs handler for fd {}", fd);
        Ok(())
    }

    fn unregister_sysfs_event_handler(&self, fd: RawFd) -> Result<(), Error> {
        match self.handlers().remove(&fd) {
            Some(_) => {
                log::debug!("unregistered sysfs handler for fd {}", fd);
                Ok(())
            }
            None => Err(Error::UnknownHandler(fd)),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for QueryInterface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fds: Vec<RawFd> = self.handlers().keys().copied().collect();
        f.debug_struct("QueryInterface")
            .field("caps", &self.caps)
            .field("source", &self.source)
            .field("sysfs_fds", &fds)
            .finish()
    }
}

/// Sysfs handler that refreshes a device interface's restrictions
///
/// Register it for the descriptor of a hotplug or firmware-reload
/// notification. A failed refresh is logged; the previous table stays in
/// effect.
pub struct RefreshHandler {
    fd: RawFd,
    target: Weak<dyn DeviceInterface>,
}

impl RefreshHandler {
    pub fn new(fd: RawFd, target: &Arc<dyn DeviceInterface>) -> Self {
        Self {
            fd,
            target: Arc::downgrade(target),
        }
    }
}

impl SysfsEventHandler for RefreshHandler {
    fn sysfs_fd(&self) -> RawFd {
        self.fd
    }

    fn handle_sysfs_event(&self) {
        let Some(target) = self.target.upgrade() else {
            log::debug!("sysfs event on fd {} after interface was dropped", self.fd);
            return;
        };
        if let Err(err) = target.update_restrictions() {
            log::warn!("restriction refresh on fd {} failed: {}", self.fd, err);
        }
    }
}
