//! # linkpack-graph
//!
//! The content link graph built for every build invocation.
//!
//! Handles:
//! - **Node**: one workspace file, its rendered bytes, and its link candidates.
//! - **Graph**: nodes keyed by workspace name, edges for discovered links,
//!   and a deterministic dependency-first ordering with cycle reporting.
//! - **Index**: construction of a graph from a file index, turning link
//!   candidates that name another file into edges.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod graph;
pub mod index;
pub mod node;

pub use graph::{Edge, LinkGraph, OutgoingLink};
pub use index::{Entry, build_graph};
pub use node::{Links, Node};
