// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Per-channel restriction types
//!
//! - [`ChannelRestriction`] - geometric and format envelope of one DPP channel
//! - [`ChannelAttributes`] - capability flags reported for a channel
//! - [`ChannelEntry`] - channel id, flags and restriction together

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::range::{RangeError, SizeRange};
use crate::fourcc::FourCC;

bitflags! {
    /// Capability flags reported by the DPU for one channel
    ///
    /// Bit positions follow the DPP attribute numbering of the kernel driver.
    /// In a restriction description these serialize as text, for example
    /// `"AFBC | ROTATE | SCALE"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ChannelAttributes: u64 {
        const AFBC         = 1 << 0;
        const BLOCK        = 1 << 1;
        const FLIP         = 1 << 2;
        const ROTATE       = 1 << 3;
        const CSC          = 1 << 4;
        const SCALE        = 1 << 5;
        const HDR          = 1 << 6;
        const C_HDR        = 1 << 7;
        const C_HDR10_PLUS = 1 << 8;
        const WCG          = 1 << 9;
        const SBWC         = 1 << 10;
        const HDR10_PLUS   = 1 << 11;

        const IDMA         = 1 << 16;
        const ODMA         = 1 << 17;
        const DPP          = 1 << 18;
        const SRAMC        = 1 << 19;
        const HDR_COMM     = 1 << 20;
    }
}

impl ChannelAttributes {
    /// Flags naming hardware blocks that several channels share. Two channels
    /// holding a common bit from this set cannot be active in one frame.
    pub const SHARED_RESOURCES: Self = Self::SRAMC.union(Self::HDR_COMM);
}

impl Default for ChannelAttributes {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for ChannelAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        bitflags::parser::to_writer(self, f)
    }
}

/// Geometric and format envelope of one DPP channel
///
/// `src_*` constrains the source buffer (full frame and crop), `dst_*` the
/// on-screen destination, `blk_*` the block (overlay) region. Bare `*_align`
/// fields constrain crop offsets; every one of them must be at least 1.
///
/// # Example
///
/// ```
/// use dpucaps::fourcc::FourCC;
/// use dpucaps::restriction::{ChannelRestriction, SizeRange};
///
/// let r = ChannelRestriction {
///     src_w: SizeRange::new(16, 4096, 1)?,
///     src_h: SizeRange::new(8, 4096, 1)?,
///     formats: [FourCC::ARGB8888, FourCC::NV12].into(),
///     scale_down: 4,
///     scale_up: 8,
///     ..Default::default()
/// };
/// assert!(r.supports_format(FourCC::NV12));
/// assert!(r.accepts_scale((1920, 1080), (480, 270)));
/// assert!(!r.accepts_scale((1920, 1080), (240, 135)));
/// # Ok::<(), dpucaps::restriction::RangeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRestriction {
    pub src_f_w: SizeRange,
    pub src_f_h: SizeRange,
    pub src_w: SizeRange,
    pub src_h: SizeRange,
    pub src_x_align: u32,
    pub src_y_align: u32,

    pub dst_f_w: SizeRange,
    pub dst_f_h: SizeRange,
    pub dst_w: SizeRange,
    pub dst_h: SizeRange,
    pub dst_x_align: u32,
    pub dst_y_align: u32,

    pub blk_w: SizeRange,
    pub blk_h: SizeRange,
    pub blk_x_align: u32,
    pub blk_y_align: u32,

    /// Tallest source crop the channel can rotate
    pub src_h_rot_max: u32,
    /// Supported pixel formats, membership only
    pub formats: BTreeSet<FourCC>,
    /// Maximum down-scale factor
    pub scale_down: u32,
    /// Maximum up-scale factor
    pub scale_up: u32,
}

impl Default for ChannelRestriction {
    fn default() -> Self {
        Self {
            src_f_w: SizeRange::UNBOUNDED,
            src_f_h: SizeRange::UNBOUNDED,
            src_w: SizeRange::UNBOUNDED,
            src_h: SizeRange::UNBOUNDED,
            src_x_align: 1,
            src_y_align: 1,
            dst_f_w: SizeRange::UNBOUNDED,
            dst_f_h: SizeRange::UNBOUNDED,
            dst_w: SizeRange::UNBOUNDED,
            dst_h: SizeRange::UNBOUNDED,
            dst_x_align: 1,
            dst_y_align: 1,
            blk_w: SizeRange::UNBOUNDED,
            blk_h: SizeRange::UNBOUNDED,
            blk_x_align: 1,
            blk_y_align: 1,
            src_h_rot_max: u32::MAX,
            formats: BTreeSet::new(),
            scale_down: 1,
            scale_up: 1,
        }
    }
}

impl ChannelRestriction {
    fn ranges(&self) -> [(&'static str, &SizeRange); 10] {
        [
            ("src_f_w", &self.src_f_w),
            ("src_f_h", &self.src_f_h),
            ("src_w", &self.src_w),
            ("src_h", &self.src_h),
            ("dst_f_w", &self.dst_f_w),
            ("dst_f_h", &self.dst_f_h),
            ("dst_w", &self.dst_w),
            ("dst_h", &self.dst_h),
            ("blk_w", &self.blk_w),
            ("blk_h", &self.blk_h),
        ]
    }

    fn aligns(&self) -> [(&'static str, u32); 6] {
        [
            ("src_x_align", self.src_x_align),
            ("src_y_align", self.src_y_align),
            ("dst_x_align", self.dst_x_align),
            ("dst_y_align", self.dst_y_align),
            ("blk_x_align", self.blk_x_align),
            ("blk_y_align", self.blk_y_align),
        ]
    }

    /// Check every range and alignment, returning the first offending field.
    pub(crate) fn check_ranges(&self) -> Result<(), (&'static str, RangeError)> {
        for (field, range) in self.ranges() {
            range.check().map_err(|err| (field, err))?;
        }
        for (field, align) in self.aligns() {
            if align == 0 {
                return Err((field, RangeError::ZeroAlign));
            }
        }
        for (field, scale) in [("scale_down", self.scale_down), ("scale_up", self.scale_up)] {
            if scale == 0 {
                return Err((field, RangeError::ZeroScale));
            }
        }
        Ok(())
    }

    pub fn supports_format(&self, format: FourCC) -> bool {
        self.formats.contains(&format)
    }

    /// Whether the full source buffer size fits the channel
    pub fn accepts_source_frame(&self, width: u32, height: u32) -> bool {
        self.src_f_w.accepts(width) && self.src_f_h.accepts(height)
    }

    /// Whether a source crop rectangle is legal for the channel
    pub fn accepts_source_crop(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        aligned(x, self.src_x_align)
            && aligned(y, self.src_y_align)
            && self.src_w.accepts(width)
            && self.src_h.accepts(height)
    }

    /// Whether the destination frame (the display mode) fits the channel
    pub fn accepts_destination_frame(&self, width: u32, height: u32) -> bool {
        self.dst_f_w.accepts(width) && self.dst_f_h.accepts(height)
    }

    /// Whether an on-screen destination rectangle is legal for the channel
    pub fn accepts_destination(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        aligned(x, self.dst_x_align)
            && aligned(y, self.dst_y_align)
            && self.dst_w.accepts(width)
            && self.dst_h.accepts(height)
    }

    /// Whether scaling `src` (width, height) to `dst` stays inside the
    /// channel's down-scale and up-scale factors on both axes.
    pub fn accepts_scale(&self, src: (u32, u32), dst: (u32, u32)) -> bool {
        let axis = |s: u32, d: u32| {
            let (s, d) = (u64::from(s), u64::from(d));
            s <= d * u64::from(self.scale_down) && d <= s * u64::from(self.scale_up)
        };
        axis(src.0, dst.0) && axis(src.1, dst.1)
    }

    /// Whether a source crop of this height may be rotated
    pub fn accepts_rotated_source(&self, height: u32) -> bool {
        height <= self.src_h_rot_max
    }
}

fn aligned(value: u32, align: u32) -> bool {
    value.checked_rem(align) == Some(0)
}

/// One physical channel: id, capability flags, and restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub id: i32,
    #[serde(default)]
    pub attributes: ChannelAttributes,
    pub restriction: ChannelRestriction,
}

impl ChannelEntry {
    pub fn new(id: i32, attributes: ChannelAttributes, restriction: ChannelRestriction) -> Self {
        Self {
            id,
            attributes,
            restriction,
        }
    }
}

/// Multi-line dump in the layout of the DPU driver's restriction log.
impl fmt::Display for ChannelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.restriction;
        writeln!(
            f,
            "id: {}, attributes: {} ({:#x})",
            self.id,
            self.attributes,
            self.attributes.bits()
        )?;
        writeln!(
            f,
            "  src_f_w{} src_f_h{} src_w{} src_h{} src_x_y_align[{}, {}]",
            r.src_f_w, r.src_f_h, r.src_w, r.src_h, r.src_x_align, r.src_y_align
        )?;
        writeln!(
            f,
            "  dst_f_w{} dst_f_h{} dst_w{} dst_h{} dst_x_y_align[{}, {}]",
            r.dst_f_w, r.dst_f_h, r.dst_w, r.dst_h, r.dst_x_align, r.dst_y_align
        )?;
        writeln!(
            f,
            "  blk_w{} blk_h{} blk_x_y_align[{}, {}]",
            r.blk_w, r.blk_h, r.blk_x_align, r.blk_y_align
        )?;
        writeln!(f, "  src_h_rot_max[{}]", r.src_h_rot_max)?;
        let formats: Vec<String> = r.formats.iter().map(|f| f.to_string()).collect();
        writeln!(f, "  formats: {}", formats.join(" "))?;
        write!(f, "  scale down: {}, up: {}", r.scale_down, r.scale_up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_resources() {
        assert!(ChannelAttributes::SHARED_RESOURCES.contains(ChannelAttributes::SRAMC));
        assert!(ChannelAttributes::SHARED_RESOURCES.contains(ChannelAttributes::HDR_COMM));
        assert!(!ChannelAttributes::SHARED_RESOURCES.contains(ChannelAttributes::ROTATE));
    }

    #[test]
    fn test_attributes_display() {
        let attrs = ChannelAttributes::AFBC | ChannelAttributes::ROTATE;
        assert_eq!(format!("{}", attrs), "AFBC | ROTATE");
        assert_eq!(format!("{}", ChannelAttributes::empty()), "none");
    }

    #[test]
    fn test_check_ranges_reports_field() {
        let r = ChannelRestriction {
            dst_y_align: 0,
            ..Default::default()
        };
        assert_eq!(r.check_ranges(), Err(("dst_y_align", RangeError::ZeroAlign)));
        assert!(ChannelRestriction::default().check_ranges().is_ok());
    }

    #[test]
    fn test_check_ranges_rejects_zero_scale() {
        let r = ChannelRestriction {
            scale_down: 0,
            ..Default::default()
        };
        assert_eq!(r.check_ranges(), Err(("scale_down", RangeError::ZeroScale)));

        let r = ChannelRestriction {
            scale_up: 0,
            ..Default::default()
        };
        assert_eq!(r.check_ranges(), Err(("scale_up", RangeError::ZeroScale)));
        assert!(!r.accepts_scale((100, 100), (100, 100)));
    }

    #[test]
    fn test_source_crop() {
        let r = ChannelRestriction {
            src_w: SizeRange::new(16, 4096, 2).unwrap(),
            src_h: SizeRange::new(8, 2160, 2).unwrap(),
            src_x_align: 2,
            src_y_align: 2,
            ..Default::default()
        };
        assert!(r.accepts_source_crop(0, 0, 1920, 1080));
        assert!(!r.accepts_source_crop(1, 0, 1920, 1080));
        assert!(!r.accepts_source_crop(0, 0, 1921, 1080));
        assert!(!r.accepts_source_crop(0, 0, 1920, 4320));
    }

    #[test]
    fn test_destination_and_rotation() {
        let r = ChannelRestriction {
            dst_f_w: SizeRange::new(16, 2560, 1).unwrap(),
            dst_w: SizeRange::new(16, 2560, 1).unwrap(),
            dst_x_align: 1,
            src_h_rot_max: 2160,
            ..Default::default()
        };
        assert!(r.accepts_destination_frame(2560, 1600));
        assert!(!r.accepts_destination_frame(3840, 2160));
        assert!(r.accepts_destination(7, 3, 100, 100));
        assert!(r.accepts_rotated_source(2160));
        assert!(!r.accepts_rotated_source(2161));
    }

    #[test]
    fn test_scale_limits() {
        let r = ChannelRestriction {
            scale_down: 2,
            scale_up: 8,
            ..Default::default()
        };
        assert!(r.accepts_scale((1000, 1000), (500, 500)));
        assert!(!r.accepts_scale((1000, 1000), (499, 500)));
        assert!(r.accepts_scale((100, 100), (800, 800)));
        assert!(!r.accepts_scale((100, 100), (801, 800)));
    }

    #[test]
    fn test_entry_display() {
        let entry = ChannelEntry::new(
            3,
            ChannelAttributes::ROTATE,
            ChannelRestriction {
                formats: [FourCC::NV12, FourCC::ARGB8888].into(),
                ..Default::default()
            },
        );
        let text = format!("{}", entry);
        assert!(text.starts_with("id: 3, attributes: ROTATE (0x8)"));
        assert!(text.contains("formats: AR24 NV12"));
    }
}
