// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! DPU plane restrictions for Rust
//!
//! Models the hardware limits of a display processing unit (DPU): a set of
//! DMA-fed composition channels ("planes"), each with its own scaling,
//! cropping, alignment, and pixel format envelope. A display composition
//! manager reads these limits to decide which hardware plane may carry which
//! layer.
//!
//! The crate is split in two halves:
//!
//! - [`restriction`] - the value types describing one channel's envelope and
//!   the table that aggregates general-purpose and special-purpose channels.
//! - [`interface`] - the [`DeviceInterface`](interface::DeviceInterface)
//!   contract implemented by each backend, with its lifecycle
//!   (`init` → `post_init` → `update_restrictions`) and the shared
//!   [`CapabilityStore`](capability::CapabilityStore) that validates, commits,
//!   and derives the feature table.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dpucaps::backend::FixedInterface;
//! use dpucaps::fourcc::FourCC;
//! use dpucaps::interface::{DeviceInterface, DisplayDevice};
//! use dpucaps::restriction::{
//!     ChannelAttributes, ChannelEntry, ChannelRestriction, RestrictionTable,
//! };
//!
//! struct Panel;
//!
//! impl DisplayDevice for Panel {
//!     fn name(&self) -> &str {
//!         "panel0"
//!     }
//! }
//!
//! let restriction = ChannelRestriction {
//!     formats: [FourCC::RGBA8888].into(),
//!     ..Default::default()
//! };
//! let table = RestrictionTable {
//!     version: 1,
//!     general: vec![
//!         ChannelEntry::new(0, ChannelAttributes::empty(), restriction.clone()),
//!         ChannelEntry::new(1, ChannelAttributes::empty(), restriction.clone()),
//!     ],
//!     special: vec![ChannelEntry::new(10, ChannelAttributes::ROTATE, restriction)],
//!     ppc: 2,
//!     max_disp_freq: 800_000,
//! };
//!
//! let device: Arc<dyn DisplayDevice> = Arc::new(Panel);
//! let mut iface = FixedInterface::new(table);
//! iface.init(&device);
//! iface.post_init()?;
//! iface.update_restrictions()?;
//!
//! assert_eq!(iface.channel_count(), 2);
//! assert_eq!(iface.special_channel_id(0)?, 10);
//! # Ok::<(), dpucaps::Error>(())
//! ```
//!
//! # Support
//!
//! For questions and support:
//! - Repository: <https://github.com/EdgeFirstAI/dpucaps>
//! - Professional support: support@au-zone.com

use std::{error, fmt, io, os::fd::RawFd};

use restriction::RestrictionError;

/// Error type for DPU restriction operations
#[derive(Debug)]
pub enum Error {
    /// The operation is not implemented by this backend.
    ///
    /// Returned by the default sysfs hooks. Callers are expected to branch
    /// on it rather than treat it as a failure of the device.
    Unsupported(&'static str),

    /// A special channel index was at or beyond the channel count
    OutOfRange { index: usize, count: usize },

    /// The backend delivered restriction data that failed validation.
    ///
    /// The previously committed table stays in effect.
    Malformed(RestrictionError),

    /// A sysfs handler is already registered for this descriptor
    DuplicateHandler(RawFd),

    /// No sysfs handler is registered for this descriptor
    UnknownHandler(RawFd),

    /// I/O error from the restriction source
    Io(io::Error),

    /// Any other failure reported by a restriction source
    Source(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Unsupported(op) => write!(f, "operation not supported: {}", op),
            Error::OutOfRange { index, count } => {
                write!(f, "channel index {} out of range (count {})", index, count)
            }
            Error::Malformed(err) => write!(f, "malformed restriction data: {}", err),
            Error::DuplicateHandler(fd) => {
                write!(f, "sysfs handler already registered for fd {}", fd)
            }
            Error::UnknownHandler(fd) => write!(f, "no sysfs handler registered for fd {}", fd),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Source(err) => write!(f, "restriction source error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Malformed(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Source(err) => Some(err.as_ref()),
            Error::Unsupported(_)
            | Error::OutOfRange { .. }
            | Error::DuplicateHandler(_)
            | Error::UnknownHandler(_) => None,
        }
    }
}

impl From<RestrictionError> for Error {
    fn from(err: RestrictionError) -> Self {
        Error::Malformed(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// The fourcc module provides DRM pixel format codes.
pub mod fourcc;

/// The restriction module provides the per-channel restriction data model.
pub mod restriction;

/// The feature module derives the overlap matrix and capability summary.
pub mod feature;

/// The capability module holds the committed restriction snapshot.
pub mod capability;

/// The interface module defines the device-interface contract.
pub mod interface;

/// The backend module provides the fixed-table and live-query backends.
pub mod backend;
