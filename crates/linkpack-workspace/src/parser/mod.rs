//! Content-type parsers.
//!
//! A parser turns raw bytes into rendered bytes plus the link candidates it
//! found. It decides what is a link by asking the caller's `is_known`
//! predicate whether a value names a workspace file. Parsers are looked up
//! by detected media type; content nobody understands is reported as
//! `LinkpackError::InvalidFormat`, which callers treat as "no links".

pub mod json;

use std::collections::BTreeMap;
use std::path::Path;

use linkpack_attributes::Scalar;
use linkpack_common::constants::{
    MEDIA_TYPE_JSON, MEDIA_TYPE_OCTET_STREAM, MEDIA_TYPE_TEXT, MEDIA_TYPE_YAML,
};
use linkpack_common::error::{LinkpackError, Result};

/// Output of a parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Rendered bytes with a placeholder wherever a link was found.
    pub content: Vec<u8>,
    /// Link candidates by template variable.
    pub links: BTreeMap<String, Scalar>,
}

/// A content-type specific renderer.
pub trait Parser: Send + Sync {
    /// Media type this parser handles.
    fn media_type(&self) -> &'static str;

    /// Renders `raw`, replacing every value accepted by `is_known` with a
    /// placeholder and reporting it as a link candidate.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::InvalidFormat` if `raw` is not valid content
    /// of this type.
    fn render(&self, name: &str, raw: &[u8], is_known: &dyn Fn(&str) -> bool)
    -> Result<Rendered>;
}

/// Infers a media type from a file name's extension.
#[must_use]
pub fn media_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("json") => MEDIA_TYPE_JSON,
        Some("yaml" | "yml") => MEDIA_TYPE_YAML,
        Some("txt" | "md") => MEDIA_TYPE_TEXT,
        _ => MEDIA_TYPE_OCTET_STREAM,
    }
}

/// Parsers keyed by the media type they handle.
pub struct ParserRegistry {
    parsers: BTreeMap<&'static str, Box<dyn Parser>>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("media_types", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParserRegistry {
    /// Creates a registry with no parsers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Registers a parser under its media type, replacing any previous one.
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        let _ = self.parsers.insert(parser.media_type(), parser);
    }

    /// Detects the media type of `raw` stored under `name`.
    ///
    /// The extension decides first; content with an unknown extension whose
    /// first non-blank byte opens a JSON object or array is treated as JSON.
    #[must_use]
    pub fn detect(&self, name: &str, raw: &[u8]) -> &'static str {
        let by_name = media_type_for(name);
        if by_name != MEDIA_TYPE_OCTET_STREAM {
            return by_name;
        }
        match raw.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{' | b'[') => MEDIA_TYPE_JSON,
            _ => MEDIA_TYPE_OCTET_STREAM,
        }
    }

    /// Returns the parser for `raw` stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::InvalidFormat` if no parser handles the
    /// detected media type.
    pub fn parser_for(&self, name: &str, raw: &[u8]) -> Result<&dyn Parser> {
        let media_type = self.detect(name, raw);
        self.parsers
            .get(media_type)
            .map(|parser| &**parser)
            .ok_or_else(|| LinkpackError::InvalidFormat {
                name: name.to_owned(),
                reason: format!("no parser for media type {media_type}"),
            })
    }

    /// Detects, looks up, and runs the parser for `raw` in one step.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::InvalidFormat` if no parser accepts the content.
    pub fn render(
        &self,
        name: &str,
        raw: &[u8],
        is_known: &dyn Fn(&str) -> bool,
    ) -> Result<Rendered> {
        self.parser_for(name, raw)?.render(name, raw, is_known)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(json::JsonParser));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_for_known_extensions() {
        assert_eq!(media_type_for("a/b.json"), MEDIA_TYPE_JSON);
        assert_eq!(media_type_for("c.YAML"), MEDIA_TYPE_YAML);
        assert_eq!(media_type_for("c.yml"), MEDIA_TYPE_YAML);
        assert_eq!(media_type_for("notes.txt"), MEDIA_TYPE_TEXT);
        assert_eq!(media_type_for("blob"), MEDIA_TYPE_OCTET_STREAM);
        assert_eq!(media_type_for("image.png"), MEDIA_TYPE_OCTET_STREAM);
    }

    #[test]
    fn detect_sniffs_json_without_extension() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.detect("config", b"  {\"a\":1}"), MEDIA_TYPE_JSON);
        assert_eq!(registry.detect("list", b"\n[1,2]"), MEDIA_TYPE_JSON);
        assert_eq!(registry.detect("blob", b"\x00\x01"), MEDIA_TYPE_OCTET_STREAM);
    }

    #[test]
    fn unsupported_content_is_invalid_format() {
        let registry = ParserRegistry::default();
        let err = registry
            .render("notes.txt", b"plain words", &|_| true)
            .expect_err("no text parser");
        assert!(err.is_invalid_format());
    }

    #[test]
    fn empty_registry_rejects_json() {
        let registry = ParserRegistry::empty();
        assert!(registry.parser_for("a.json", b"{}").is_err());
    }

    #[test]
    fn default_registry_renders_json() {
        let registry = ParserRegistry::default();
        let rendered = registry
            .render("a.json", br#"{"ref":"b.json"}"#, &|v| v == "b.json")
            .expect("render");
        assert_eq!(rendered.links.len(), 1);
    }
}
