//! Graph construction from a file index.
//!
//! Every entry becomes a node; then every link candidate whose value is a
//! string equal to another entry's name becomes an edge. Membership in the
//! index is the only signal that a value is a link: any other string, and
//! every non-string value, is left as inert template data.

use linkpack_attributes::{Properties, Scalar};
use linkpack_common::error::Result;

use crate::graph::{Edge, LinkGraph};
use crate::node::{Links, Node};

/// One file of the index as handed over by the workspace and parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Workspace-relative name.
    pub name: String,
    /// Rendered bytes, with placeholders for links.
    pub content: Vec<u8>,
    /// Link candidates by template variable.
    pub links: Links,
    /// Properties for the node's descriptor.
    pub properties: Properties,
    /// Media type of the content.
    pub media_type: String,
}

impl From<Entry> for Node {
    fn from(entry: Entry) -> Self {
        let node = Self::new(entry.name, entry.content)
            .with_links(entry.links)
            .with_properties(entry.properties);
        if entry.media_type.is_empty() {
            node
        } else {
            node.with_media_type(entry.media_type)
        }
    }
}

/// Builds the link graph for a set of entries.
///
/// Nodes are inserted in name order before any edge is added, so an edge
/// never depends on entry order. Each edge carries the link attributes of
/// the node it points at.
///
/// # Errors
///
/// Returns `LinkpackError::DuplicateNode` for repeated names and
/// `LinkpackError::SelfReference` when a file links to itself.
pub fn build_graph(entries: impl IntoIterator<Item = Entry>) -> Result<LinkGraph> {
    let mut entries: Vec<Entry> = entries.into_iter().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut graph = LinkGraph::new();
    for entry in entries {
        graph.add_node(entry.into())?;
    }

    let mut pending = Vec::new();
    for node in graph.nodes() {
        for (variable, value) in node.links() {
            let Scalar::String(target) = value else {
                continue;
            };
            let Some(target_node) = graph.node(target) else {
                continue;
            };
            pending.push((
                node.name().to_owned(),
                target.clone(),
                Edge::new(variable.clone(), target_node.properties().link_or_default()),
            ));
        }
    }
    for (from, to, edge) in pending {
        graph.add_edge(&from, &to, edge)?;
    }

    tracing::info!(
        nodes = graph.len(),
        links = graph.edge_count(),
        "built link graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use linkpack_attributes::LinkAttributes;
    use linkpack_common::error::LinkpackError;

    use super::*;

    fn entry(name: &str, links: &[(&str, Scalar)]) -> Entry {
        Entry {
            name: name.into(),
            content: format!("content of {name}").into_bytes(),
            links: links
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
            ..Entry::default()
        }
    }

    #[test]
    fn string_links_to_known_names_become_edges() {
        let graph = build_graph([
            entry("a.json", &[("/ref", Scalar::String("b.json".into()))]),
            entry("b.json", &[]),
        ])
        .expect("build");
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies("a.json").expect("deps"), vec!["b.json"]);
    }

    #[test]
    fn unknown_strings_and_non_strings_stay_inert() {
        let graph = build_graph([
            entry(
                "a.json",
                &[
                    ("/title", Scalar::String("hello".into())),
                    ("/count", Scalar::Int(3)),
                    ("/flag", Scalar::Bool(true)),
                ],
            ),
            entry("b.json", &[]),
        ])
        .expect("build");
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node("a.json").expect("node").links().len(), 3);
    }

    #[test]
    fn entry_order_does_not_matter() {
        let forward = build_graph([
            entry("a", &[("v", Scalar::String("b".into()))]),
            entry("b", &[]),
        ])
        .expect("build");
        let backward = build_graph([
            entry("b", &[]),
            entry("a", &[("v", Scalar::String("b".into()))]),
        ])
        .expect("build");
        assert_eq!(
            forward.topological_order().expect("order"),
            backward.topological_order().expect("order")
        );
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let err = build_graph([entry("a", &[]), entry("a", &[])]).expect_err("duplicate");
        assert!(matches!(err, LinkpackError::DuplicateNode { .. }));
    }

    #[test]
    fn self_links_are_rejected() {
        let err = build_graph([entry("a", &[("me", Scalar::String("a".into()))])])
            .expect_err("self reference");
        assert!(matches!(err, LinkpackError::SelfReference { name } if name == "a"));
    }

    #[test]
    fn edges_carry_target_link_attributes() {
        let hints = LinkAttributes {
            registry_hint: "localhost:5000".into(),
            namespace_hint: "team/data".into(),
            transitive: true,
        };
        let mut target = entry("b", &[]);
        target.properties = Properties::new().with_link(hints.clone());
        let graph = build_graph([entry("a", &[("v", Scalar::String("b".into()))]), target])
            .expect("build");
        let outgoing = graph.outgoing("a").expect("outgoing");
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].edge.attributes, hints);
    }

    #[test]
    fn empty_media_type_falls_back_to_octet_stream() {
        let node: Node = entry("blob", &[]).into();
        assert_eq!(node.media_type(), "application/octet-stream");
        let mut typed = entry("doc", &[]);
        typed.media_type = "application/json".into();
        let node: Node = typed.into();
        assert_eq!(node.media_type(), "application/json");
    }
}
