//! OCI image manifest assembly.
//!
//! A build becomes one image: an empty `{}` configuration blob and one
//! layer per resolved node, in resolution order, so every layer's
//! dependencies appear before it.

use std::collections::BTreeMap;

use linkpack_builder::BuildReport;
use linkpack_builder::digest::digest_bytes;
use linkpack_common::constants::{MEDIA_TYPE_OCI_CONFIG, MEDIA_TYPE_OCI_MANIFEST};
use linkpack_common::error::Result;
use linkpack_common::types::Descriptor;
use serde::{Deserialize, Serialize};

/// Content of the configuration blob.
const EMPTY_CONFIG: &[u8] = b"{}";

/// A blob and its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Descriptor of `content`.
    pub descriptor: Descriptor,
    /// Raw bytes.
    pub content: Vec<u8>,
}

impl Blob {
    /// Wraps `content`, computing its digest and size.
    #[must_use]
    pub fn new(media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            descriptor: Descriptor {
                media_type: media_type.into(),
                digest: digest_bytes(&content),
                size: content.len() as u64,
                annotations: BTreeMap::new(),
            },
            content,
        }
    }
}

/// Serialized form of an OCI image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Always 2.
    pub schema_version: u32,
    /// Manifest media type.
    pub media_type: String,
    /// Configuration blob.
    pub config: Descriptor,
    /// Layer blobs, dependencies first.
    pub layers: Vec<Descriptor>,
    /// Manifest annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A complete image ready to be written or pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The manifest blob.
    pub manifest: Blob,
    /// The configuration blob.
    pub config: Blob,
    /// Layer blobs in manifest order.
    pub layers: Vec<Blob>,
}

impl Image {
    /// Configuration and layer blobs, in upload order.
    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        std::iter::once(&self.config).chain(&self.layers)
    }
}

/// Collects layers and produces an [`Image`].
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    layers: Vec<Blob>,
    annotations: BTreeMap<String, String>,
}

impl ManifestBuilder {
    /// Creates a builder with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder holding every resolved node of `report`.
    #[must_use]
    pub fn from_report(report: &BuildReport) -> Self {
        let layers = report
            .layers()
            .map(|(descriptor, content)| Blob {
                descriptor: descriptor.clone(),
                content: content.to_vec(),
            })
            .collect();
        Self {
            layers,
            annotations: BTreeMap::new(),
        }
    }

    /// Appends a layer.
    #[must_use]
    pub fn layer(mut self, blob: Blob) -> Self {
        self.layers.push(blob);
        self
    }

    /// Sets a manifest annotation.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.annotations.insert(key.into(), value.into());
        self
    }

    /// Serializes the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn build(self) -> Result<Image> {
        let config = Blob::new(MEDIA_TYPE_OCI_CONFIG, EMPTY_CONFIG.to_vec());
        let manifest = Manifest {
            schema_version: 2,
            media_type: MEDIA_TYPE_OCI_MANIFEST.to_owned(),
            config: config.descriptor.clone(),
            layers: self.layers.iter().map(|b| b.descriptor.clone()).collect(),
            annotations: self.annotations,
        };
        let manifest = Blob::new(MEDIA_TYPE_OCI_MANIFEST, serde_json::to_vec(&manifest)?);
        tracing::debug!(
            digest = %manifest.descriptor.digest,
            layers = self.layers.len(),
            "manifest assembled"
        );
        Ok(Image {
            manifest,
            config,
            layers: self.layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_known_digest() {
        let image = ManifestBuilder::new().build().expect("build");
        assert_eq!(image.config.content, b"{}");
        assert_eq!(
            image.config.descriptor.digest.to_string(),
            "sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_eq!(image.config.descriptor.media_type, MEDIA_TYPE_OCI_CONFIG);
    }

    #[test]
    fn manifest_lists_layers_in_order() {
        let image = ManifestBuilder::new()
            .layer(Blob::new("text/plain", b"first".to_vec()))
            .layer(Blob::new("text/plain", b"second".to_vec()))
            .annotation("org.opencontainers.image.version", "1")
            .build()
            .expect("build");

        let manifest: Manifest =
            serde_json::from_slice(&image.manifest.content).expect("manifest json");
        assert_eq!(manifest.schema_version, 2);
        assert_eq!(manifest.media_type, MEDIA_TYPE_OCI_MANIFEST);
        assert_eq!(manifest.layers.len(), 2);
        assert_eq!(manifest.layers[0].digest, digest_bytes(b"first"));
        assert_eq!(manifest.layers[1].digest, digest_bytes(b"second"));
        assert_eq!(manifest.config, image.config.descriptor);
        assert_eq!(image.blobs().count(), 3);
    }

    #[test]
    fn manifest_bytes_are_stable() {
        let build = || {
            ManifestBuilder::new()
                .layer(Blob::new("text/plain", b"x".to_vec()))
                .build()
                .expect("build")
        };
        assert_eq!(build().manifest, build().manifest);
    }
}
