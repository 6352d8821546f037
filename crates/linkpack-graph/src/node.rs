//! Graph nodes.

use std::collections::BTreeMap;

use linkpack_attributes::{Properties, Scalar};
use linkpack_common::constants::MEDIA_TYPE_OCTET_STREAM;

/// Template variable name to the raw candidate value a parser extracted.
///
/// Only string values that equal another node's name become edges; the rest
/// are inert template data.
pub type Links = BTreeMap<String, Scalar>;

/// One workspace content item.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    raw_content: Vec<u8>,
    links: Links,
    properties: Properties,
    media_type: String,
}

impl Node {
    /// Creates a link-free node with default properties.
    #[must_use]
    pub fn new(name: impl Into<String>, raw_content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            raw_content: raw_content.into(),
            links: Links::new(),
            properties: Properties::default(),
            media_type: MEDIA_TYPE_OCTET_STREAM.to_owned(),
        }
    }

    /// Sets the link candidates.
    #[must_use]
    pub fn with_links(mut self, links: Links) -> Self {
        self.links = links;
        self
    }

    /// Sets the properties attached to this node's descriptor.
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the media type reported in this node's descriptor.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// Workspace-relative name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content before link resolution.
    #[must_use]
    pub fn raw_content(&self) -> &[u8] {
        &self.raw_content
    }

    /// Link candidates by template variable.
    #[must_use]
    pub const fn links(&self) -> &Links {
        &self.links
    }

    /// Properties attached to this node.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Media type of this node's content.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}
