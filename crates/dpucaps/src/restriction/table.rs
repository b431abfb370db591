// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::channel::ChannelEntry;
use super::range::RangeError;

/// Which of the two channel sequences an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    /// DPP DMA channels used for ordinary window composition
    General,
    /// Special purpose plane (SPP) channels, addressed by index
    Special,
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelClass::General => write!(f, "general"),
            ChannelClass::Special => write!(f, "special"),
        }
    }
}

/// Restrictions of every channel the DPU reports
///
/// Both sequences keep the physical enumeration order of the backend. The
/// position of a special channel is its address for downstream planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionTable {
    /// Restriction format version reported by the backend
    pub version: u32,
    /// General composition channels
    #[serde(default)]
    pub general: Vec<ChannelEntry>,
    /// Special purpose channels
    #[serde(default)]
    pub special: Vec<ChannelEntry>,
    /// Pixels per cycle
    #[serde(default)]
    pub ppc: u32,
    /// Maximum display clock, in kHz
    #[serde(default)]
    pub max_disp_freq: u32,
}

impl RestrictionTable {
    pub fn channels(&self, class: ChannelClass) -> &[ChannelEntry] {
        match class {
            ChannelClass::General => &self.general,
            ChannelClass::Special => &self.special,
        }
    }

    /// Look up a general channel by its hardware id.
    pub fn find_general(&self, id: i32) -> Option<&ChannelEntry> {
        self.general.iter().find(|entry| entry.id == id)
    }

    /// Validate the table against the invariants every backend must honour.
    ///
    /// Checks, in order: `version >= min_version`, then for each sequence
    /// every size range and alignment, non-empty formats, and unique ids.
    pub fn validate(&self, min_version: u32) -> Result<(), RestrictionError> {
        if self.version < min_version {
            return Err(RestrictionError::UnsupportedVersion {
                found: self.version,
                minimum: min_version,
            });
        }

        for class in [ChannelClass::General, ChannelClass::Special] {
            let mut ids = HashSet::new();
            for entry in self.channels(class) {
                entry
                    .restriction
                    .check_ranges()
                    .map_err(|(field, source)| RestrictionError::InvalidRange {
                        class,
                        id: entry.id,
                        field,
                        source,
                    })?;
                if entry.restriction.formats.is_empty() {
                    return Err(RestrictionError::EmptyFormats {
                        class,
                        id: entry.id,
                    });
                }
                if !ids.insert(entry.id) {
                    return Err(RestrictionError::DuplicateId {
                        class,
                        id: entry.id,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Reason a restriction table was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionError {
    /// A size range or alignment of one channel is invalid
    InvalidRange {
        class: ChannelClass,
        id: i32,
        field: &'static str,
        source: RangeError,
    },
    /// A channel lists no pixel formats
    EmptyFormats { class: ChannelClass, id: i32 },
    /// Two channels of the same class share an id
    DuplicateId { class: ChannelClass, id: i32 },
    /// The backend reports an older restriction format than it supports
    UnsupportedVersion { found: u32, minimum: u32 },
}

impl fmt::Display for RestrictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionError::InvalidRange {
                class,
                id,
                field,
                source,
            } => write!(f, "{} channel {}: {}: {}", class, id, field, source),
            RestrictionError::EmptyFormats { class, id } => {
                write!(f, "{} channel {} has no pixel formats", class, id)
            }
            RestrictionError::DuplicateId { class, id } => {
                write!(f, "duplicate {} channel id {}", class, id)
            }
            RestrictionError::UnsupportedVersion { found, minimum } => write!(
                f,
                "restriction version {} is older than the minimum {}",
                found, minimum
            ),
        }
    }
}

impl std::error::Error for RestrictionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RestrictionError::InvalidRange { source, .. } => Some(source),
            _ => None,
        }
    }
}
