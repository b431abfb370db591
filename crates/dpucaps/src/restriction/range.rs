// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed size interval with a required alignment for one dimension.
///
/// A value is accepted when it lies in `[min, max]` and is a multiple of
/// `align`. The fields are private so that every instance, including those
/// read from a restriction description, went through [`SizeRange::new`].
///
/// # Example
///
/// ```
/// use dpucaps::restriction::SizeRange;
///
/// let width = SizeRange::new(16, 4096, 2)?;
/// assert!(width.accepts(1920));
/// assert!(!width.accepts(1921));
/// assert!(SizeRange::new(64, 32, 1).is_err());
/// # Ok::<(), dpucaps::restriction::RangeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSizeRange")]
pub struct SizeRange {
    min: u32,
    max: u32,
    align: u32,
}

#[derive(Deserialize)]
struct RawSizeRange {
    min: u32,
    max: u32,
    #[serde(default = "default_align")]
    align: u32,
}

fn default_align() -> u32 {
    1
}

impl SizeRange {
    /// Accepts every value.
    pub const UNBOUNDED: SizeRange = SizeRange {
        min: 0,
        max: u32::MAX,
        align: 1,
    };

    /// Create a validated range.
    ///
    /// # Errors
    ///
    /// [`RangeError::Inverted`] if `min > max`, [`RangeError::ZeroAlign`] if
    /// `align == 0`.
    pub fn new(min: u32, max: u32, align: u32) -> Result<Self, RangeError> {
        let range = SizeRange { min, max, align };
        range.check()?;
        Ok(range)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn align(&self) -> u32 {
        self.align
    }

    /// Whether `value` lies in `[min, max]` and is a multiple of `align`.
    pub fn accepts(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value) && value % self.align == 0
    }

    pub(crate) fn check(&self) -> Result<(), RangeError> {
        if self.min > self.max {
            return Err(RangeError::Inverted {
                min: self.min,
                max: self.max,
            });
        }
        if self.align == 0 {
            return Err(RangeError::ZeroAlign);
        }
        Ok(())
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl TryFrom<RawSizeRange> for SizeRange {
    type Error = RangeError;

    fn try_from(raw: RawSizeRange) -> Result<Self, Self::Error> {
        SizeRange::new(raw.min, raw.max, raw.align)
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.min, self.max, self.align)
    }
}

/// Reason a [`SizeRange`] or bare alignment was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// `min` is greater than `max`
    Inverted { min: u32, max: u32 },
    /// Alignment of zero
    ZeroAlign,
    /// Scale factor of zero, which would reject even 1:1
    ZeroScale,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Inverted { min, max } => {
                write!(f, "min {} is greater than max {}", min, max)
            }
            RangeError::ZeroAlign => write!(f, "alignment must be at least 1"),
            RangeError::ZeroScale => write!(f, "scale factor must be at least 1"),
        }
    }
}

impl std::error::Error for RangeError {}
