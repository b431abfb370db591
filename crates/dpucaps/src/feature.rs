// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Feature table derived from committed channel restrictions
//!
//! The composition planner asks the same questions every frame: can these
//! two channels be used together, which channels are interchangeable, what
//! crop does a YUV layer need. [`FeatureTable::derive`] answers them once per
//! restriction refresh so each query is a lookup.
//!
//! # Overlap
//!
//! Two general channels overlap when their attribute sets share a bit of
//! [`ChannelAttributes::SHARED_RESOURCES`]; such channels compete for one
//! hardware block and cannot be active in the same frame. The matrix is sized
//! from the real channel count and is symmetric.
//!
//! # Capability Classes
//!
//! Channels reporting identical attribute sets form one class, represented by
//! its first channel. Size restrictions are computed once per class.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::fourcc::FourCC;
use crate::restriction::{ChannelAttributes, ChannelEntry, ChannelRestriction};

/// Chroma subsampling factor applied to YUV alignments.
pub const YUV_CHROMA_SUBSAMPLE: u32 = 2;

/// Smallest crop edge accepted for YUV sources.
pub const YUV_MIN_CROP: u32 = 32;

/// Symmetric channel-pair flags
///
/// Stored flat as `count * count` flags. Indices at or beyond `count`, and
/// the diagonal, always answer `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapMatrix {
    count: usize,
    flags: Vec<bool>,
}

impl OverlapMatrix {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            flags: vec![false; count * count],
        }
    }

    /// Number of channels the matrix covers
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mark `i` and `j` as mutually exclusive. Out of range pairs and the
    /// diagonal are ignored.
    pub fn set(&mut self, i: usize, j: usize) {
        if i == j || i >= self.count || j >= self.count {
            return;
        }
        self.flags[i * self.count + j] = true;
        self.flags[j * self.count + i] = true;
    }

    pub fn overlaps(&self, i: usize, j: usize) -> bool {
        i < self.count && j < self.count && self.flags[i * self.count + j]
    }

    /// Overlapping pairs with `i < j`
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.count)
            .flat_map(move |i| (i + 1..self.count).map(move |j| (i, j)))
            .filter(move |&(i, j)| self.overlaps(i, j))
    }
}

/// Pixel format family a size restriction applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatClass {
    Rgb,
    Yuv,
}

impl FormatClass {
    pub fn of(format: FourCC) -> Self {
        if format.is_yuv() {
            FormatClass::Yuv
        } else {
            FormatClass::Rgb
        }
    }
}

/// Flattened size limits of one capability class for one format family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeRestriction {
    pub max_down_scale: u32,
    pub max_up_scale: u32,
    pub max_full_width: u32,
    pub max_full_height: u32,
    pub min_full_width: u32,
    pub min_full_height: u32,
    pub full_width_align: u32,
    pub full_height_align: u32,
    pub max_crop_width: u32,
    pub max_crop_height: u32,
    pub min_crop_width: u32,
    pub min_crop_height: u32,
    pub crop_x_align: u32,
    pub crop_y_align: u32,
    pub crop_width_align: u32,
    pub crop_height_align: u32,
}

impl SizeRestriction {
    pub fn rgb(r: &ChannelRestriction) -> Self {
        Self {
            max_down_scale: r.scale_down,
            max_up_scale: r.scale_up,
            max_full_width: r.dst_f_w.max(),
            max_full_height: r.dst_f_h.max(),
            min_full_width: r.dst_f_w.min(),
            min_full_height: r.dst_f_h.min(),
            full_width_align: r.dst_x_align,
            full_height_align: r.dst_y_align,
            max_crop_width: r.src_w.max(),
            max_crop_height: r.src_h.max(),
            min_crop_width: r.src_w.min(),
            min_crop_height: r.src_h.min(),
            crop_x_align: r.src_x_align,
            crop_y_align: r.src_y_align,
            crop_width_align: r.blk_x_align,
            crop_height_align: r.blk_y_align,
        }
    }

    /// RGB limits tightened to chroma sample boundaries.
    ///
    /// The minimum crop is raised to [`YUV_MIN_CROP`] but never past the
    /// channel's maximum crop.
    pub fn yuv(r: &ChannelRestriction) -> Self {
        let chroma = |align: u32| align.max(YUV_CHROMA_SUBSAMPLE);
        let rgb = Self::rgb(r);
        Self {
            min_crop_width: rgb
                .min_crop_width
                .max(YUV_MIN_CROP)
                .min(rgb.max_crop_width),
            min_crop_height: rgb
                .min_crop_height
                .max(YUV_MIN_CROP)
                .min(rgb.max_crop_height),
            full_width_align: chroma(rgb.full_width_align),
            full_height_align: chroma(rgb.full_height_align),
            crop_x_align: chroma(rgb.crop_x_align),
            crop_y_align: chroma(rgb.crop_y_align),
            crop_width_align: chroma(rgb.crop_width_align),
            crop_height_align: chroma(rgb.crop_height_align),
            ..rgb
        }
    }

    pub fn for_class(r: &ChannelRestriction, class: FormatClass) -> Self {
        match class {
            FormatClass::Rgb => Self::rgb(r),
            FormatClass::Yuv => Self::yuv(r),
        }
    }
}

/// Compact capability summary of the general channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureTable {
    overlap: OverlapMatrix,
    classes: Vec<usize>,
    attributes: ChannelAttributes,
    formats: BTreeSet<FourCC>,
    sizes: BTreeMap<usize, (SizeRestriction, SizeRestriction)>,
}

impl FeatureTable {
    /// Derive the table from general channels in enumeration order.
    pub fn derive(channels: &[ChannelEntry]) -> Self {
        let mut overlap = OverlapMatrix::new(channels.len());
        let mut classes = Vec::with_capacity(channels.len());
        let mut attributes = ChannelAttributes::empty();
        let mut formats = BTreeSet::new();
        let mut sizes = BTreeMap::new();

        for (i, entry) in channels.iter().enumerate() {
            let shared = entry.attributes & ChannelAttributes::SHARED_RESOURCES;
            if !shared.is_empty() {
                for (j, other) in channels.iter().enumerate().take(i) {
                    if other.attributes.intersects(shared) {
                        overlap.set(i, j);
                    }
                }
            }

            let class = channels
                .iter()
                .position(|other| other.attributes == entry.attributes)
                .unwrap_or(i);
            classes.push(class);

            attributes |= entry.attributes;
            formats.extend(entry.restriction.formats.iter().copied());

            if class == i {
                sizes.insert(
                    i,
                    (
                        SizeRestriction::rgb(&entry.restriction),
                        SizeRestriction::yuv(&entry.restriction),
                    ),
                );
            }

            log::debug!(
                "channel {} (id {}): attributes {}, class {}",
                i,
                entry.id,
                entry.attributes,
                class
            );
        }

        for (i, j) in overlap.pairs() {
            log::debug!("channels {} and {} share a hardware block", i, j);
        }

        Self {
            overlap,
            classes,
            attributes,
            formats,
            sizes,
        }
    }

    pub fn overlap(&self) -> &OverlapMatrix {
        &self.overlap
    }

    /// Whether general channels `i` and `j` cannot be used in one frame
    pub fn overlaps(&self, i: usize, j: usize) -> bool {
        self.overlap.overlaps(i, j)
    }

    /// Index of the first channel with the same attribute set as `index`
    pub fn class_of(&self, index: usize) -> Option<usize> {
        self.classes.get(index).copied()
    }

    /// Whether an earlier channel already describes this channel's class
    pub fn is_duplicate(&self, index: usize) -> bool {
        self.class_of(index).is_some_and(|class| class != index)
    }

    /// Union of every general channel's attributes
    pub fn attributes(&self) -> ChannelAttributes {
        self.attributes
    }

    /// Union of every general channel's formats
    pub fn formats(&self) -> &BTreeSet<FourCC> {
        &self.formats
    }

    /// Size limits for channel `index` when carrying `class` formats
    pub fn size_restriction(&self, index: usize, class: FormatClass) -> Option<&SizeRestriction> {
        let (rgb, yuv) = self.sizes.get(&self.class_of(index)?)?;
        Some(match class {
            FormatClass::Rgb => rgb,
            FormatClass::Yuv => yuv,
        })
    }
}
