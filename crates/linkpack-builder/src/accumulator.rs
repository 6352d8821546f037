//! Ordered descriptor collection handed to manifest assembly.

use std::collections::BTreeMap;

use linkpack_common::error::{LinkpackError, Result};
use linkpack_common::types::Descriptor;

use crate::resolve::Resolution;

/// Descriptors in dependency order, one per node name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorAccumulator {
    entries: Vec<(String, Descriptor)>,
    /// Position of each name in `entries`.
    index: BTreeMap<String, usize>,
}

impl DescriptorAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every descriptor of `resolution` in resolution order.
    #[must_use]
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut accumulator = Self::new();
        for (name, node) in resolution.iter() {
            accumulator.insert(name.to_owned(), node.descriptor.clone());
        }
        accumulator
    }

    /// Appends the descriptor of `name`.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::DuplicateNode` if `name` was already pushed.
    pub fn push(&mut self, name: impl Into<String>, descriptor: Descriptor) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(LinkpackError::DuplicateNode { name });
        }
        self.insert(name, descriptor);
        Ok(())
    }

    fn insert(&mut self, name: String, descriptor: Descriptor) {
        let _ = self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, descriptor));
    }

    /// Descriptor of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.index
            .get(name)
            .and_then(|&position| self.entries.get(position))
            .map(|(_, descriptor)| descriptor)
    }

    /// Name and descriptor pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Descriptors in order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no descriptor was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the accumulator, returning the ordered descriptors.
    #[must_use]
    pub fn into_descriptors(self) -> Vec<Descriptor> {
        self.entries.into_iter().map(|(_, d)| d).collect()
    }
}
