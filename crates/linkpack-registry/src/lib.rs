//! # linkpack-registry
//!
//! Packages a resolved build as an OCI image.
//!
//! Handles:
//! - **Manifest**: one layer per resolved node, dependencies first, with an
//!   empty configuration blob.
//! - **Layout**: writing images into an OCI image layout directory.
//! - **Remote**: pushing images to an OCI distribution registry.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod layout;
pub mod manifest;
pub mod reference;
pub mod remote;
pub mod target;

pub use layout::LayoutWriter;
pub use manifest::{Blob, Image, Manifest, ManifestBuilder};
pub use reference::Reference;
pub use remote::{RegistryOptions, RemoteRegistry};
pub use target::ImageTarget;
