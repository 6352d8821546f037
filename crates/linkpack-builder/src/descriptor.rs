//! Descriptor computation and the encoding embedded in place of a link.

use std::collections::BTreeMap;

use linkpack_attributes::LinkAttributes;
use linkpack_common::constants::{ANNOTATION_LINK, ANNOTATION_PROPERTIES, ANNOTATION_TITLE};
use linkpack_common::error::Result;
use linkpack_common::types::Descriptor;
use linkpack_graph::Node;

use crate::digest::digest_bytes;

/// Computes the descriptor of a node from its fully resolved content.
///
/// The title annotation carries the node name. Non-empty properties are
/// stored as their canonical JSON under the properties annotation.
///
/// # Errors
///
/// Returns an error if the properties cannot be serialized.
pub fn describe(node: &Node, content: &[u8]) -> Result<Descriptor> {
    let mut annotations = BTreeMap::new();
    let _ = annotations.insert(ANNOTATION_TITLE.to_owned(), node.name().to_owned());
    if !node.properties().is_empty() {
        let _ = annotations.insert(
            ANNOTATION_PROPERTIES.to_owned(),
            node.properties().to_json()?,
        );
    }
    Ok(Descriptor {
        media_type: node.media_type().to_owned(),
        digest: digest_bytes(content),
        size: content.len() as u64,
        annotations,
    })
}

/// Builds the descriptor embedded where one edge references `target`.
///
/// Identity fields come from the target's own descriptor; annotations name
/// the target and carry this edge's link attributes, so two edges to the
/// same target with different attributes embed different annotations.
///
/// # Errors
///
/// Returns an error if the link attributes cannot be serialized.
pub fn link_reference(
    target: &str,
    descriptor: &Descriptor,
    link: &LinkAttributes,
) -> Result<Descriptor> {
    let mut annotations = BTreeMap::new();
    let _ = annotations.insert(ANNOTATION_TITLE.to_owned(), target.to_owned());
    let _ = annotations.insert(ANNOTATION_LINK.to_owned(), serde_json::to_string(link)?);
    Ok(Descriptor {
        media_type: descriptor.media_type.clone(),
        digest: descriptor.digest.clone(),
        size: descriptor.size,
        annotations,
    })
}

/// Canonical byte encoding of a descriptor: compact JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(descriptor: &Descriptor) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(descriptor)?)
}
