//! # linkpack-attributes
//!
//! The metadata model carried by every node and link:
//! - **Attributes**: [`AttributeSet`](attributes::AttributeSet), a sorted map
//!   of typed scalar and list values.
//! - **Properties**: [`Properties`](properties::Properties), the bundle of
//!   link attributes, descriptor attributes, and named attribute sets that
//!   ends up in blob annotations.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod attributes;
pub mod properties;

pub use attributes::{AttributeSet, AttributeValue, Kind, Scalar};
pub use properties::{Component, DescriptorAttributes, LinkAttributes, Properties};
