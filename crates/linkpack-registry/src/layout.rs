//! OCI image layout on the local filesystem.
//!
//! ```text
//! <root>/
//! ├── oci-layout
//! ├── index.json
//! └── blobs/sha256/<hex>
//! ```

use std::path::{Path, PathBuf};

use linkpack_builder::CancelToken;
use linkpack_common::constants::{
    ANNOTATION_REF_NAME, MEDIA_TYPE_OCI_INDEX, OCI_LAYOUT_VERSION,
};
use linkpack_common::error::{LinkpackError, Result};
use linkpack_common::types::{Descriptor, Digest};
use serde::{Deserialize, Serialize};

use crate::manifest::{Blob, Image};
use crate::reference::Reference;
use crate::target::ImageTarget;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutMarker {
    image_layout_version: String,
}

/// Serialized form of an OCI image index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Always 2.
    pub schema_version: u32,
    /// Index media type.
    pub media_type: String,
    /// Manifests, each tagged through the ref-name annotation.
    pub manifests: Vec<Descriptor>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            schema_version: 2,
            media_type: MEDIA_TYPE_OCI_INDEX.to_owned(),
            manifests: Vec::new(),
        }
    }
}

/// Writes images into an OCI image layout directory.
#[derive(Debug, Clone)]
pub struct LayoutWriter {
    root: PathBuf,
    cancel: CancelToken,
}

impl LayoutWriter {
    /// Opens or initializes the layout at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or marker file cannot be written.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let blobs = root.join("blobs").join("sha256");
        std::fs::create_dir_all(&blobs).map_err(|e| LinkpackError::Io {
            path: blobs.clone(),
            source: e,
        })?;
        let marker = LayoutMarker {
            image_layout_version: OCI_LAYOUT_VERSION.to_owned(),
        };
        write_file(&root.join("oci-layout"), &serde_json::to_vec(&marker)?)?;
        tracing::info!(path = %root.display(), "opened image layout");
        Ok(Self {
            root,
            cancel: CancelToken::new(),
        })
    }

    /// Stops a publish before the next blob once `cancel` is triggered.
    ///
    /// A canceled publish leaves `index.json` untouched.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the layout root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob with `digest`.
    #[must_use]
    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.as_hex())
    }

    /// Stores a blob unless it is already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    pub fn write_blob(&self, blob: &Blob) -> Result<PathBuf> {
        let path = self.blob_path(&blob.descriptor.digest);
        if path.exists() {
            tracing::debug!(digest = %blob.descriptor.digest, "blob already present");
            return Ok(path);
        }
        write_file(&path, &blob.content)?;
        tracing::debug!(digest = %blob.descriptor.digest, size = blob.descriptor.size, "blob written");
        Ok(path)
    }

    /// Reads the current index, or an empty one if none was written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the index exists but cannot be read or parsed.
    pub fn index(&self) -> Result<Index> {
        let path = self.root.join("index.json");
        if !path.exists() {
            return Ok(Index::default());
        }
        let content = std::fs::read(&path).map_err(|e| LinkpackError::Io { path, source: e })?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn write_index(&self, index: &Index) -> Result<()> {
        write_file(
            &self.root.join("index.json"),
            &serde_json::to_vec_pretty(index)?,
        )
    }
}

impl ImageTarget for LayoutWriter {
    fn publish(&self, reference: &Reference, image: &Image) -> Result<Digest> {
        for blob in image.blobs() {
            self.cancel.check()?;
            let _ = self.write_blob(blob)?;
        }
        self.cancel.check()?;
        let _ = self.write_blob(&image.manifest)?;

        let tag = reference.tag();
        let mut entry = image.manifest.descriptor.clone();
        let _ = entry
            .annotations
            .insert(ANNOTATION_REF_NAME.to_owned(), tag.to_owned());

        let mut index = self.index()?;
        index
            .manifests
            .retain(|m| m.annotation(ANNOTATION_REF_NAME) != Some(tag));
        index.manifests.push(entry);
        self.write_index(&index)?;

        tracing::info!(
            path = %self.root.display(),
            tag,
            digest = %image.manifest.descriptor.digest,
            "image written to layout"
        );
        Ok(image.manifest.descriptor.digest.clone())
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content).map_err(|e| LinkpackError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestBuilder;

    fn image(content: &[u8]) -> Image {
        ManifestBuilder::new()
            .layer(Blob::new("text/plain", content.to_vec()))
            .build()
            .expect("build")
    }

    #[test]
    fn open_writes_layout_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = LayoutWriter::open(dir.path()).expect("open");
        let marker = std::fs::read_to_string(dir.path().join("oci-layout")).expect("marker");
        assert_eq!(marker, r#"{"imageLayoutVersion":"1.0.0"}"#);
        assert!(dir.path().join("blobs/sha256").is_dir());
    }

    #[test]
    fn publish_stores_every_blob_and_indexes_tag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = LayoutWriter::open(dir.path()).expect("open");
        let image = image(b"layer");
        let reference: Reference = "local/app:v1".parse().expect("reference");

        let digest = layout.publish(&reference, &image).expect("publish");
        assert_eq!(digest, image.manifest.descriptor.digest);

        for blob in image.blobs().chain(std::iter::once(&image.manifest)) {
            let stored = std::fs::read(layout.blob_path(&blob.descriptor.digest)).expect("blob");
            assert_eq!(stored, blob.content);
        }
        let index = layout.index().expect("index");
        assert_eq!(index.manifests.len(), 1);
        assert_eq!(index.manifests[0].annotation(ANNOTATION_REF_NAME), Some("v1"));
        assert_eq!(index.manifests[0].digest, digest);
    }

    #[test]
    fn republishing_a_tag_replaces_its_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = LayoutWriter::open(dir.path()).expect("open");
        let v1: Reference = "local/app:v1".parse().expect("v1");
        let v2: Reference = "local/app:v2".parse().expect("v2");

        let _ = layout.publish(&v1, &image(b"one")).expect("first");
        let _ = layout.publish(&v2, &image(b"two")).expect("second");
        let latest = layout.publish(&v1, &image(b"three")).expect("third");

        let index = layout.index().expect("index");
        assert_eq!(index.manifests.len(), 2);
        let v1_entry = index
            .manifests
            .iter()
            .find(|m| m.annotation(ANNOTATION_REF_NAME) == Some("v1"))
            .expect("v1 entry");
        assert_eq!(v1_entry.digest, latest);
    }

    #[test]
    fn canceled_publish_leaves_index_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cancel = CancelToken::new();
        let layout = LayoutWriter::open(dir.path())
            .expect("open")
            .with_cancel(cancel.clone());
        let image = image(b"layer");
        let reference: Reference = "local/app:v1".parse().expect("reference");
        cancel.cancel();

        let err = layout.publish(&reference, &image).expect_err("canceled");
        assert!(matches!(err, LinkpackError::Canceled));
        assert!(!dir.path().join("index.json").exists());
        assert!(!layout.blob_path(&image.manifest.descriptor.digest).exists());
    }
}
