//! Push to an OCI distribution registry over HTTP.
//!
//! Blobs are checked with `HEAD` and uploaded monolithically: a `POST` opens
//! an upload session, then a single `PUT` with `?digest=` completes it. The
//! manifest is stored last, under the reference's tag. The cancel token is
//! checked before every blob and before the manifest.

use linkpack_builder::CancelToken;
use linkpack_common::error::{LinkpackError, Result};
use linkpack_common::types::Digest;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};

use crate::manifest::{Blob, Image};
use crate::reference::Reference;
use crate::target::ImageTarget;

/// Connection settings for a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    /// Talk plain HTTP instead of HTTPS.
    pub plain_http: bool,
}

/// Client for the OCI distribution push flow.
#[derive(Debug, Clone)]
pub struct RemoteRegistry {
    client: Client,
    options: RegistryOptions,
    cancel: CancelToken,
}

impl RemoteRegistry {
    /// Creates a client with the given options.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Registry` if the HTTP client cannot be built.
    pub fn new(options: RegistryOptions) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(options.insecure)
            .user_agent(concat!("linkpack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| registry_error("failed to build HTTP client", &e))?;
        Ok(Self {
            client,
            options,
            cancel: CancelToken::new(),
        })
    }

    /// Stops a push at the next blob once `cancel` is triggered.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Base URL of the host, `scheme://registry`.
    #[must_use]
    pub fn host_url(&self, reference: &Reference) -> String {
        let scheme = if self.options.plain_http {
            "http"
        } else {
            "https"
        };
        format!("{scheme}://{}", reference.registry())
    }

    /// Base URL of the repository API, `scheme://registry/v2/repository`.
    #[must_use]
    pub fn repository_url(&self, reference: &Reference) -> String {
        format!("{}/v2/{}", self.host_url(reference), reference.repository())
    }

    /// Returns `true` if the registry already has the blob.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Registry` on transport failure or an
    /// unexpected status.
    pub fn blob_exists(&self, reference: &Reference, digest: &Digest) -> Result<bool> {
        let url = format!("{}/blobs/{digest}", self.repository_url(reference));
        let response = self
            .client
            .head(&url)
            .send()
            .map_err(|e| registry_error(&format!("HEAD {url}"), &e))?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(LinkpackError::Registry {
                message: format!("HEAD {url}: unexpected status {status}"),
            }),
        }
    }

    /// Uploads a blob unless the registry already has it.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Registry` if the upload is rejected.
    pub fn upload_blob(&self, reference: &Reference, blob: &Blob) -> Result<()> {
        let digest = &blob.descriptor.digest;
        if self.blob_exists(reference, digest)? {
            tracing::debug!(%digest, "blob already in registry");
            return Ok(());
        }

        let start = format!("{}/blobs/uploads/", self.repository_url(reference));
        let response = self
            .client
            .post(&start)
            .send()
            .map_err(|e| registry_error(&format!("POST {start}"), &e))?;
        expect_status(&start, response.status(), StatusCode::ACCEPTED)?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| LinkpackError::Registry {
                message: format!("POST {start}: missing upload location"),
            })?;

        let url = upload_url(&self.host_url(reference), location, digest);
        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(blob.content.clone())
            .send()
            .map_err(|e| registry_error(&format!("PUT {url}"), &e))?;
        expect_status(&url, response.status(), StatusCode::CREATED)?;
        tracing::debug!(%digest, size = blob.descriptor.size, "blob uploaded");
        Ok(())
    }

    /// Stores the manifest under the reference's tag.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Registry` if the manifest is rejected.
    pub fn put_manifest(&self, reference: &Reference, manifest: &Blob) -> Result<()> {
        let url = format!(
            "{}/manifests/{}",
            self.repository_url(reference),
            reference.tag()
        );
        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, manifest.descriptor.media_type.as_str())
            .body(manifest.content.clone())
            .send()
            .map_err(|e| registry_error(&format!("PUT {url}"), &e))?;
        expect_status(&url, response.status(), StatusCode::CREATED)
    }
}

impl ImageTarget for RemoteRegistry {
    fn publish(&self, reference: &Reference, image: &Image) -> Result<Digest> {
        for blob in image.blobs() {
            self.cancel.check()?;
            self.upload_blob(reference, blob)?;
        }
        self.cancel.check()?;
        self.put_manifest(reference, &image.manifest)?;
        tracing::info!(
            %reference,
            digest = %image.manifest.descriptor.digest,
            "manifest pushed"
        );
        Ok(image.manifest.descriptor.digest.clone())
    }
}

/// Completes an upload location with the blob digest.
///
/// Relative locations are resolved against `host`.
fn upload_url(host: &str, location: &str, digest: &Digest) -> String {
    let base = if location.starts_with("http://") || location.starts_with("https://") {
        location.to_owned()
    } else {
        format!("{host}/{}", location.trim_start_matches('/'))
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}digest={digest}")
}

fn expect_status(url: &str, actual: StatusCode, expected: StatusCode) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(LinkpackError::Registry {
        message: format!("{url}: expected status {expected}, got {actual}"),
    })
}

fn registry_error(context: &str, error: &reqwest::Error) -> LinkpackError {
    LinkpackError::Registry {
        message: format!("{context}: {error}"),
    }
}
