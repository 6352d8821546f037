//! JSON parser.
//!
//! Every string value accepted by `is_known` becomes a link. Its template
//! variable is the value's JSON pointer (RFC 6901), and in the rendered
//! document the whole string token, quotes included, is replaced by the
//! placeholder, so substituting a JSON descriptor yields valid JSON again.
//!
//! Placeholders occur only at link positions. Any `{{` already present in
//! the document (always inside a string) is written as `\u007b{`, which
//! decodes to the same text.

use std::collections::BTreeMap;

use linkpack_attributes::Scalar;
use linkpack_common::constants::{MEDIA_TYPE_JSON, placeholder};
use linkpack_common::error::{LinkpackError, Result};
use serde_json::Value;

use super::{Parser, Rendered};

/// Marker prefix used while the document is being re-serialized.
const MARKER_PREFIX: &str = "__linkpack_link_";

/// Renders JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn media_type(&self) -> &'static str {
        MEDIA_TYPE_JSON
    }

    fn render(
        &self,
        name: &str,
        raw: &[u8],
        is_known: &dyn Fn(&str) -> bool,
    ) -> Result<Rendered> {
        let mut document: Value =
            serde_json::from_slice(raw).map_err(|e| LinkpackError::InvalidFormat {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;

        let prefix = unique_prefix(raw);
        let mut collector = Collector {
            is_known,
            prefix: &prefix,
            links: BTreeMap::new(),
            markers: Vec::new(),
        };
        collector.visit(&mut document, &mut String::new());

        let mut text = escape_placeholder_open(&serde_json::to_string_pretty(&document)?);
        for (marker, variable) in &collector.markers {
            text = text.replace(&format!("\"{marker}\""), &placeholder(variable));
        }
        tracing::debug!(name, links = collector.links.len(), "rendered json");
        Ok(Rendered {
            content: text.into_bytes(),
            links: collector.links,
        })
    }
}

struct Collector<'a> {
    is_known: &'a dyn Fn(&str) -> bool,
    prefix: &'a str,
    links: BTreeMap<String, Scalar>,
    markers: Vec<(String, String)>,
}

impl Collector<'_> {
    fn visit(&mut self, value: &mut Value, pointer: &mut String) {
        match value {
            Value::String(s) if (self.is_known)(s.as_str()) => {
                let variable = if pointer.is_empty() {
                    "/".to_owned()
                } else {
                    pointer.clone()
                };
                let marker = format!("{}{}__", self.prefix, self.markers.len());
                let original = std::mem::replace(s, marker.clone());
                let _ = self.links.insert(variable.clone(), Scalar::String(original));
                self.markers.push((marker, variable));
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    let len = pointer.len();
                    pointer.push('/');
                    pointer.push_str(&i.to_string());
                    self.visit(item, pointer);
                    pointer.truncate(len);
                }
            }
            Value::Object(entries) => {
                for (key, item) in entries.iter_mut() {
                    let len = pointer.len();
                    pointer.push('/');
                    pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                    self.visit(item, pointer);
                    pointer.truncate(len);
                }
            }
            _ => {}
        }
    }
}

/// Escapes every `{` that directly precedes another `{`.
///
/// Pretty-printed JSON never places two braces side by side outside a
/// string, so only string contents are affected.
fn escape_placeholder_open(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            out.push_str("\\u007b");
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns a marker prefix that does not occur in the input.
fn unique_prefix(raw: &[u8]) -> String {
    let mut prefix = MARKER_PREFIX.to_owned();
    while raw
        .windows(prefix.len())
        .any(|window| window == prefix.as_bytes())
    {
        prefix.push('_');
    }
    prefix
}
