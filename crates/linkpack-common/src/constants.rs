//! System-wide constants: media types, annotation keys, and defaults.

/// Digest algorithm used for every blob.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Opening delimiter of a link placeholder in rendered content.
pub const PLACEHOLDER_OPEN: &str = "{{";

/// Closing delimiter of a link placeholder in rendered content.
pub const PLACEHOLDER_CLOSE: &str = "}}";

/// Returns the placeholder text for a template variable.
#[must_use]
pub fn placeholder(variable: &str) -> String {
    format!("{PLACEHOLDER_OPEN}{variable}{PLACEHOLDER_CLOSE}")
}

/// OCI annotation holding the workspace name of a blob.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// OCI annotation holding the tag of a manifest in an image layout index.
pub const ANNOTATION_REF_NAME: &str = "org.opencontainers.image.ref.name";

/// Annotation holding a node's serialized properties.
pub const ANNOTATION_PROPERTIES: &str = "io.linkpack.properties";

/// Annotation holding an edge's serialized link attributes.
pub const ANNOTATION_LINK: &str = "io.linkpack.link";

/// Media type for JSON content.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Media type for YAML content.
pub const MEDIA_TYPE_YAML: &str = "application/yaml";

/// Media type for plain text content.
pub const MEDIA_TYPE_TEXT: &str = "text/plain";

/// Fallback media type for content of unknown type.
pub const MEDIA_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Media type of the OCI image configuration blob.
pub const MEDIA_TYPE_OCI_CONFIG: &str = "application/vnd.oci.image.config.v1+json";

/// Media type of an OCI image manifest.
pub const MEDIA_TYPE_OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type of an OCI image index.
pub const MEDIA_TYPE_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Version written to the `oci-layout` marker file.
pub const OCI_LAYOUT_VERSION: &str = "1.0.0";

/// Tag used when a destination reference omits one.
pub const DEFAULT_TAG: &str = "latest";

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "linkpack-workspace";

/// Application name used in CLI output.
pub const APP_NAME: &str = "linkpack";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "lpk";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_wraps_variable() {
        assert_eq!(placeholder("/settings/ref"), "{{/settings/ref}}");
    }
}
