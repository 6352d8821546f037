//! Sequential resolution along the topological order.
//!
//! Each node is visited once, after all of its dependencies. Its links'
//! placeholders are replaced by the encoded descriptors of their targets,
//! and the node's own descriptor is computed from the substituted bytes.

use std::collections::BTreeMap;

use linkpack_common::error::{LinkpackError, Result};
use linkpack_common::types::Descriptor;
use linkpack_graph::LinkGraph;

use crate::accumulator::DescriptorAccumulator;
use crate::cancel::CancelToken;
use crate::descriptor::{describe, encode, link_reference};
use crate::substitute::substitute;

/// Final bytes and descriptor of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    /// Content with every link placeholder substituted.
    pub content: Vec<u8>,
    /// Descriptor computed from `content`.
    pub descriptor: Descriptor,
}

/// Output of a successful resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    order: Vec<String>,
    nodes: BTreeMap<String, ResolvedNode>,
}

impl Resolution {
    pub(crate) const fn new(order: Vec<String>, nodes: BTreeMap<String, ResolvedNode>) -> Self {
        Self { order, nodes }
    }

    /// Node names in the order they were resolved.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Resolved node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedNode> {
        self.nodes.get(name)
    }

    /// Descriptor of a node by name.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.nodes.get(name).map(|node| &node.descriptor)
    }

    /// Descriptors keyed by node name.
    #[must_use]
    pub fn descriptors(&self) -> BTreeMap<&str, &Descriptor> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.as_str(), &node.descriptor))
            .collect()
    }

    /// Resolved nodes in dependency order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedNode)> {
        self.order
            .iter()
            .filter_map(|name| self.nodes.get(name).map(|node| (name.as_str(), node)))
    }

    /// Number of resolved nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collects the descriptors in dependency order.
    #[must_use]
    pub fn to_accumulator(&self) -> DescriptorAccumulator {
        DescriptorAccumulator::from_resolution(self)
    }

    /// Consumes the resolution, returning the resolved bytes by name.
    #[must_use]
    pub fn into_contents(self) -> BTreeMap<String, Vec<u8>> {
        self.nodes
            .into_iter()
            .map(|(name, node)| (name, node.content))
            .collect()
    }
}

/// Resolves every node of `graph`.
///
/// # Errors
///
/// Returns `LinkpackError::CycleDetected` if the graph has a cycle, or the
/// first error raised while resolving a node. No partial output is returned.
pub fn resolve(graph: &LinkGraph) -> Result<Resolution> {
    resolve_with_cancel(graph, &CancelToken::new())
}

/// Like [`resolve`], checking `cancel` before each node.
///
/// # Errors
///
/// Returns `LinkpackError::Canceled` once `cancel` is triggered, in
/// addition to the errors of [`resolve`].
pub fn resolve_with_cancel(graph: &LinkGraph, cancel: &CancelToken) -> Result<Resolution> {
    let order = graph.topological_order()?;
    tracing::info!(nodes = order.len(), "resolution order computed");

    let mut nodes: BTreeMap<String, ResolvedNode> = BTreeMap::new();
    for name in &order {
        cancel.check()?;
        let resolved = resolve_node(graph, name, |dep| nodes.get(dep).map(|n| &n.descriptor))?;
        let _ = nodes.insert(name.clone(), resolved);
    }
    Ok(Resolution::new(order, nodes))
}

/// Resolves a single node given a lookup for already resolved descriptors.
pub(crate) fn resolve_node<'a>(
    graph: &LinkGraph,
    name: &str,
    lookup: impl Fn(&str) -> Option<&'a Descriptor>,
) -> Result<ResolvedNode> {
    let node = graph.node(name).ok_or_else(|| LinkpackError::NodeNotFound {
        name: name.to_owned(),
    })?;

    let mut replacements = BTreeMap::new();
    for link in graph.outgoing(name)? {
        let target = lookup(link.target).ok_or_else(|| LinkpackError::UnresolvedDependency {
            node: name.to_owned(),
            dependency: link.target.to_owned(),
        })?;
        let reference = link_reference(link.target, target, &link.edge.attributes)?;
        let _ = replacements.insert(link.edge.variable.clone(), encode(&reference)?);
    }

    let (content, used) = substitute(node.raw_content(), &replacements);
    for variable in replacements.keys() {
        if !used.contains(variable.as_str()) {
            tracing::warn!(node = %name, %variable, "link placeholder not present in content");
        }
    }

    let descriptor = describe(node, &content)?;
    tracing::debug!(node = %name, digest = %descriptor.digest, size = descriptor.size, "node resolved");
    Ok(ResolvedNode {
        content,
        descriptor,
    })
}
