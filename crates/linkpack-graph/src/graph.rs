//! Content link graph backed by `petgraph`.
//!
//! Nodes are workspace files; an edge `from -> to` records that `from`'s
//! rendered content embeds a reference to `to`. Ordering walks the graph
//! depth-first so that every dependency precedes its dependents.

use std::collections::BTreeMap;

use linkpack_attributes::LinkAttributes;
use linkpack_common::error::{LinkpackError, Result};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::node::Node;

/// Payload of a link edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Template variable whose placeholder the link replaces.
    pub variable: String,
    /// How the reference is expressed once resolved.
    pub attributes: LinkAttributes,
}

impl Edge {
    /// Creates an edge payload.
    #[must_use]
    pub fn new(variable: impl Into<String>, attributes: LinkAttributes) -> Self {
        Self {
            variable: variable.into(),
            attributes,
        }
    }
}

/// An outgoing edge as seen from its source node.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingLink<'a> {
    /// Name of the target node.
    pub target: &'a str,
    /// Edge payload.
    pub edge: &'a Edge,
}

/// Traversal state of a node during ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A directed graph of workspace files and the links between them.
#[derive(Debug, Default)]
pub struct LinkGraph {
    graph: petgraph::Graph<Node, Edge>,
    index: BTreeMap<String, NodeIndex>,
}

impl LinkGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::DuplicateNode` if the name is already present.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(node.name()) {
            return Err(LinkpackError::DuplicateNode {
                name: node.name().to_owned(),
            });
        }
        let name = node.name().to_owned();
        tracing::debug!(node = %name, links = node.links().len(), "adding node");
        let idx = self.graph.add_node(node);
        let _ = self.index.insert(name, idx);
        Ok(())
    }

    /// Adds a link edge: `from` depends on `to`.
    ///
    /// Several edges may join the same pair as long as their variables
    /// differ. A failed call leaves the graph unchanged.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::SelfReference` if `from == to`,
    /// `LinkpackError::NodeNotFound` if either endpoint is absent, and
    /// `LinkpackError::DuplicateLink` if `from` already binds the variable.
    pub fn add_edge(&mut self, from: &str, to: &str, edge: Edge) -> Result<()> {
        if from == to {
            return Err(LinkpackError::SelfReference {
                name: from.to_owned(),
            });
        }
        let from_idx = self.lookup(from)?;
        let to_idx = self.lookup(to)?;
        if self
            .graph
            .edges(from_idx)
            .any(|e| e.weight().variable == edge.variable)
        {
            return Err(LinkpackError::DuplicateLink {
                name: from.to_owned(),
                variable: edge.variable,
            });
        }
        tracing::debug!(from, to, variable = %edge.variable, "adding link");
        let _ = self.graph.add_edge(from_idx, to_idx, edge);
        Ok(())
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// Returns `true` if a node with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index.values().map(|&idx| &self.graph[idx])
    }

    /// Iterates over node names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing links of `name`, sorted by template variable.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::NodeNotFound` if the node does not exist.
    pub fn outgoing(&self, name: &str) -> Result<Vec<OutgoingLink<'_>>> {
        let idx = self.lookup(name)?;
        let mut links: Vec<OutgoingLink<'_>> = self
            .graph
            .edges(idx)
            .map(|e| OutgoingLink {
                target: self.graph[e.target()].name(),
                edge: e.weight(),
            })
            .collect();
        links.sort_by(|a, b| a.edge.variable.cmp(&b.edge.variable));
        Ok(links)
    }

    /// Distinct names `name` depends on, in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::NodeNotFound` if the node does not exist.
    pub fn dependencies(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.lookup(name)?;
        Ok(self
            .sorted_dependencies(idx)
            .into_iter()
            .map(|dep| self.graph[dep].name())
            .collect())
    }

    /// Returns the names in dependency order: for every edge `from -> to`,
    /// `to` comes before `from`.
    ///
    /// Roots and siblings are visited in lexicographic order, so the result
    /// is the same for the same graph on every run.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::CycleDetected` naming the members of the
    /// first cycle found.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());

        for &root in self.index.values() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::InProgress;
            let mut stack = vec![(root, self.sorted_dependencies(root), 0_usize)];

            while let Some(frame) = stack.last_mut() {
                let next = frame.1.get(frame.2).copied();
                frame.2 += 1;
                match next {
                    Some(dep) => match marks[dep.index()] {
                        Mark::Done => {}
                        Mark::InProgress => {
                            let start = stack.iter().position(|f| f.0 == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = stack[start..]
                                .iter()
                                .map(|f| self.graph[f.0].name().to_owned())
                                .collect();
                            cycle.push(self.graph[dep].name().to_owned());
                            tracing::warn!(cycle = ?cycle, "cyclic link detected");
                            return Err(LinkpackError::CycleDetected { cycle });
                        }
                        Mark::Unvisited => {
                            marks[dep.index()] = Mark::InProgress;
                            stack.push((dep, self.sorted_dependencies(dep), 0));
                        }
                    },
                    None => {
                        if let Some((done, _, _)) = stack.pop() {
                            marks[done.index()] = Mark::Done;
                            order.push(self.graph[done].name().to_owned());
                        }
                    }
                }
            }
        }

        tracing::debug!(nodes = order.len(), "computed topological order");
        Ok(order)
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LinkpackError::NodeNotFound {
                name: name.to_owned(),
            })
    }

    fn sorted_dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self.graph.edges(idx).map(|e| e.target()).collect();
        deps.sort_by(|a, b| self.graph[*a].name().cmp(self.graph[*b].name()));
        deps.dedup();
        deps
    }
}
