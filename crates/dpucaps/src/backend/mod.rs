// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Device interface backends
//!
//! | Backend | `use_query` | Restriction source |
//! |---------|-------------|--------------------|
//! | [`FixedInterface`] | `false` | Table supplied at construction |
//! | [`QueryInterface`] | `true` | Any [`RestrictionSource`], queried on each refresh |
//!
//! [`QueryInterface`] also keeps a registry of sysfs event handlers and hands
//! per-display interfaces a [`CapabilityReader`](crate::capability::CapabilityReader).
//! [`RefreshHandler`] is a ready-made handler that refreshes the restrictions
//! whenever its descriptor fires.

mod fixed;
mod query;

pub use fixed::FixedInterface;
pub use query::{QueryInterface, RefreshHandler, RestrictionSource};
