// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Committed DPU capabilities and the shared derivation helper
//!
//! Every backend owns one [`CapabilityStore`]. It tracks the interface
//! lifecycle, holds the weak back-reference to the owning device, and keeps
//! the current [`DeviceCapabilityInfo`] as an immutable snapshot behind a
//! reader/writer lock.
//!
//! # Refresh
//!
//! [`CapabilityStore::make_dpu_restrictions`] is the single validate-then-
//! commit path used by all backends:
//!
//! 1. dump each channel with [`CapabilityStore::print_dpp_restriction`]
//! 2. validate the table ([`RestrictionTable::validate`])
//! 3. build a fresh [`DeviceCapabilityInfo`] and derive its feature table
//! 4. swap it in under the write lock
//!
//! A table that fails validation is reported and dropped; readers keep
//! seeing the previous snapshot. Because a snapshot is replaced wholesale,
//! refreshes never merge and a reader never observes a partial update.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::feature::FeatureTable;
use crate::interface::DisplayDevice;
use crate::restriction::{ChannelEntry, RestrictionTable};
use crate::Error;

/// Lifecycle of a device interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InterfaceState {
    #[default]
    Uninitialized,
    /// Bound to its owning device by `init`
    Initialized,
    /// Backend setup done by `post_init`
    PostInitialized,
    /// At least one restriction table has been committed
    RestrictionsReady,
}

/// Restriction table plus the feature table derived from it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCapabilityInfo {
    table: RestrictionTable,
    features: FeatureTable,
}

impl DeviceCapabilityInfo {
    /// Wrap a table and derive its feature table.
    pub fn new(table: RestrictionTable) -> Self {
        let mut info = Self {
            table,
            features: FeatureTable::default(),
        };
        info.update_feature_table();
        info
    }

    /// Re-derive the feature table from the committed general channels.
    pub fn update_feature_table(&mut self) {
        self.features = FeatureTable::derive(&self.table.general);
    }

    pub fn table(&self) -> &RestrictionTable {
        &self.table
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn channel_count(&self) -> usize {
        self.table.general.len()
    }

    pub fn special_channel_count(&self) -> usize {
        self.table.special.len()
    }

    /// Special channel at `index`
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `index >= special_channel_count()`.
    pub fn special_channel(&self, index: usize) -> Result<&ChannelEntry, Error> {
        self.table.special.get(index).ok_or(Error::OutOfRange {
            index,
            count: self.table.special.len(),
        })
    }

    /// Whether general channels `i` and `j` cannot be used in one frame
    pub fn overlaps(&self, i: usize, j: usize) -> bool {
        self.features.overlaps(i, j)
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: InterfaceState,
    info: Arc<DeviceCapabilityInfo>,
}

fn read(shared: &RwLock<Shared>) -> RwLockReadGuard<'_, Shared> {
    // Every write stores a complete snapshot, so a poisoned lock still
    // guards consistent data.
    shared.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(shared: &RwLock<Shared>) -> RwLockWriteGuard<'_, Shared> {
    shared.write().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only handle to a store's committed capabilities
///
/// Cheap to clone; per-display interfaces keep one to read the latest
/// snapshot without holding a reference to the device interface.
#[derive(Debug, Clone)]
pub struct CapabilityReader {
    shared: Arc<RwLock<Shared>>,
}

impl CapabilityReader {
    pub fn snapshot(&self) -> Arc<DeviceCapabilityInfo> {
        read(&self.shared).info.clone()
    }

    pub fn state(&self) -> InterfaceState {
        read(&self.shared).state
    }
}

/// Lifecycle and restriction snapshot shared by all backends
#[derive(Debug)]
pub struct CapabilityStore {
    device: Option<Weak<dyn DisplayDevice>>,
    use_query: bool,
    min_version: u32,
    shared: Arc<RwLock<Shared>>,
}

impl CapabilityStore {
    /// Create an empty store.
    ///
    /// * `use_query` - whether the backend queries live hardware
    /// * `min_version` - oldest restriction version the backend accepts
    pub fn new(use_query: bool, min_version: u32) -> Self {
        Self {
            device: None,
            use_query,
            min_version,
            shared: Arc::default(),
        }
    }

    /// Bind the owning device.
    ///
    /// # Panics
    ///
    /// If called more than once.
    pub fn bind(&mut self, device: &Arc<dyn DisplayDevice>) {
        let mut shared = write(&self.shared);
        assert!(
            shared.state == InterfaceState::Uninitialized,
            "device interface initialized twice"
        );
        self.device = Some(Arc::downgrade(device));
        shared.state = InterfaceState::Initialized;
        log::debug!("device interface bound to {}", device.name());
    }

    /// Record that backend setup has completed.
    ///
    /// # Panics
    ///
    /// Unless the store is in [`InterfaceState::Initialized`].
    pub fn finish_post_init(&mut self) {
        let mut shared = write(&self.shared);
        assert!(
            shared.state == InterfaceState::Initialized,
            "post_init called in state {:?}",
            shared.state
        );
        shared.state = InterfaceState::PostInitialized;
    }

    /// Check that `post_init` may run, before a backend acquires anything.
    ///
    /// # Panics
    ///
    /// Unless the store is in [`InterfaceState::Initialized`].
    pub fn assert_initialized(&self) {
        let state = self.state();
        assert!(
            state == InterfaceState::Initialized,
            "post_init called in state {:?}",
            state
        );
    }

    /// # Panics
    ///
    /// If `post_init` has not completed yet.
    pub fn assert_post_initialized(&self) {
        let state = self.state();
        assert!(
            state >= InterfaceState::PostInitialized,
            "restrictions updated in state {:?}",
            state
        );
    }

    /// Owning device, if it is still alive
    pub fn device(&self) -> Option<Arc<dyn DisplayDevice>> {
        self.device.as_ref().and_then(Weak::upgrade)
    }

    pub fn use_query(&self) -> bool {
        self.use_query
    }

    pub fn min_version(&self) -> u32 {
        self.min_version
    }

    pub fn state(&self) -> InterfaceState {
        read(&self.shared).state
    }

    /// Current committed capabilities. Empty until the first successful
    /// refresh.
    pub fn snapshot(&self) -> Arc<DeviceCapabilityInfo> {
        read(&self.shared).info.clone()
    }

    pub fn reader(&self) -> CapabilityReader {
        CapabilityReader {
            shared: self.shared.clone(),
        }
    }

    /// Validate `table` and, if it is well formed, commit it together with
    /// its derived feature table.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] if validation fails; the previous snapshot stays
    /// in effect.
    ///
    /// # Panics
    ///
    /// If `post_init` has not completed yet.
    pub fn make_dpu_restrictions(&self, table: RestrictionTable) -> Result<(), Error> {
        self.assert_post_initialized();

        log::debug!(
            "DPP restriction version {}, {} general, {} special channels",
            table.version,
            table.general.len(),
            table.special.len()
        );
        for entry in table.general.iter().chain(&table.special) {
            Self::print_dpp_restriction(entry);
        }

        if let Err(err) = table.validate(self.min_version) {
            log::error!(
                "rejecting DPU restrictions, keeping version {}: {}",
                self.snapshot().table().version,
                err
            );
            return Err(err.into());
        }

        let info = Arc::new(DeviceCapabilityInfo::new(table));
        let mut shared = write(&self.shared);
        shared.info = info;
        shared.state = InterfaceState::RestrictionsReady;
        log::info!(
            "DPU restrictions updated: version {}, {} general, {} special channels",
            shared.info.table().version,
            shared.info.channel_count(),
            shared.info.special_channel_count()
        );
        Ok(())
    }

    /// Dump one channel's restriction at debug level.
    pub fn print_dpp_restriction(entry: &ChannelEntry) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for line in entry.to_string().lines() {
            log::debug!("{}", line);
        }
    }
}
