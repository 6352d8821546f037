//! # linkpack-builder
//!
//! Resolves a content link graph into content-addressed blobs.
//!
//! Handles:
//! - **Descriptors**: SHA-256 digests and the descriptor embedded in place
//!   of each link placeholder.
//! - **Resolution**: dependency-first substitution, sequential or spread
//!   across worker threads level by level, with cooperative cancellation.
//! - **Accumulation**: the ordered descriptor list handed to manifest
//!   assembly.
//! - **Builds**: indexing a workspace, resolving it, and writing the
//!   resolved files out.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod accumulator;
pub mod build;
pub mod cancel;
pub mod descriptor;
pub mod digest;
pub mod parallel;
pub mod resolve;
pub mod substitute;

pub use accumulator::DescriptorAccumulator;
pub use build::{
    BuildOptions, BuildReport, build_workspace, index_workspace, plan_workspace, properties_for,
};
pub use cancel::CancelToken;
pub use parallel::resolve_parallel;
pub use resolve::{Resolution, ResolvedNode, resolve, resolve_with_cancel};
