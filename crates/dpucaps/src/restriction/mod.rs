// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! DPU channel restriction data model
//!
//! Value types describing what each hardware channel (plane) of the display
//! processing unit accepts:
//!
//! | Type | Describes |
//! |------|-----------|
//! | [`SizeRange`] | `[min, max]` interval plus alignment for one dimension |
//! | [`ChannelRestriction`] | Source, destination and block geometry, formats, scale limits |
//! | [`ChannelAttributes`] | Capability flags (rotation, AFBC, HDR, shared blocks) |
//! | [`ChannelEntry`] | One channel: id, attributes and restriction |
//! | [`RestrictionTable`] | Every general and special channel plus clock data |
//!
//! # Channel Classes
//!
//! Channels come in two classes which planning logic treats separately:
//!
//! - **General** channels serve ordinary window composition.
//! - **Special** channels serve auxiliary hardware effects and are addressed
//!   by their position in [`RestrictionTable::special`].
//!
//! # Validation
//!
//! [`RestrictionTable::validate`] checks the invariants a backend must meet
//! before a table can be committed: a supported version, well-formed ranges
//! and alignments, at least one pixel format per channel, and ids unique
//! within each class.

mod channel;
mod range;
mod table;

pub use channel::{ChannelAttributes, ChannelEntry, ChannelRestriction};
pub use range::{RangeError, SizeRange};
pub use table::{ChannelClass, RestrictionError, RestrictionTable};
