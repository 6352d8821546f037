//! # linkpack-workspace
//!
//! The collaborators the build engine reads from and writes to.
//!
//! Handles:
//! - **Local**: a directory-backed [`Workspace`](local::Workspace) that lists,
//!   reads, and writes content by workspace-relative name.
//! - **Parser**: content-type detection and the [`Parser`](parser::Parser)
//!   capability that renders bytes and reports link candidates.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod local;
pub mod parser;

pub use local::{LocalWorkspace, Workspace};
pub use parser::{Parser, ParserRegistry, Rendered, media_type_for};
