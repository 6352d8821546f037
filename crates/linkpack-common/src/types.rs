//! Domain primitive types used across the linkpack workspace.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DIGEST_ALGORITHM, SHA256_HEX_LENGTH};
use crate::error::{LinkpackError, Result};

/// SHA-256 content digest, rendered as `sha256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Creates a digest from a hex-encoded SHA-256 value.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a 64-character lowercase hex string.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(LinkpackError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex))
    }

    /// Creates a digest from a raw 32-byte SHA-256 output.
    #[must_use]
    pub fn from_sha256(raw: [u8; 32]) -> Self {
        Self(hex::encode(raw))
    }

    /// Returns the hex-encoded hash string without the algorithm prefix.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Returns the algorithm name.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        DIGEST_ALGORITHM
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DIGEST_ALGORITHM}:{}", self.0)
    }
}

impl FromStr for Digest {
    type Err = LinkpackError;

    fn from_str(s: &str) -> Result<Self> {
        let Some((algorithm, hex)) = s.split_once(':') else {
            return Err(LinkpackError::Config {
                message: format!("digest {s} is missing an algorithm prefix"),
            });
        };
        if algorithm != DIGEST_ALGORITHM {
            return Err(LinkpackError::Config {
                message: format!("unsupported digest algorithm: {algorithm}"),
            });
        }
        Self::from_hex(hex)
    }
}

impl TryFrom<String> for Digest {
    type Error = LinkpackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.to_string()
    }
}

/// Content identity of a blob: media type, digest, size, and annotations.
///
/// Field names follow the OCI content descriptor so the serialized form can
/// be placed directly in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the blob.
    pub media_type: String,
    /// Digest of the blob bytes.
    pub digest: Digest,
    /// Size of the blob in bytes.
    pub size: u64,
    /// Annotations, sorted by key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Descriptor {
    /// Returns an annotation value.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn digest_displays_with_algorithm_prefix() {
        let digest = Digest::from_hex(EMPTY_SHA256).expect("valid hex");
        assert_eq!(digest.to_string(), format!("sha256:{EMPTY_SHA256}"));
        assert_eq!(digest.as_hex(), EMPTY_SHA256);
    }

    #[test]
    fn digest_rejects_short_or_uppercase_hex() {
        assert!(Digest::from_hex("abc").is_err());
        assert!(Digest::from_hex(EMPTY_SHA256.to_uppercase()).is_err());
    }

    #[test]
    fn digest_parses_prefixed_form() {
        let parsed: Digest = format!("sha256:{EMPTY_SHA256}").parse().expect("parse");
        assert_eq!(parsed.as_hex(), EMPTY_SHA256);
        assert!("md5:abcd".parse::<Digest>().is_err());
        assert!(EMPTY_SHA256.parse::<Digest>().is_err());
    }

    #[test]
    fn digest_from_raw_bytes_is_lowercase_hex() {
        let digest = Digest::from_sha256([0xab; 32]);
        assert_eq!(digest.as_hex(), "ab".repeat(32));
    }

    #[test]
    fn descriptor_uses_oci_field_names() {
        let descriptor = Descriptor {
            media_type: "application/json".into(),
            digest: Digest::from_hex(EMPTY_SHA256).expect("valid hex"),
            size: 0,
            annotations: BTreeMap::new(),
        };
        let json = serde_json::to_string(&descriptor).expect("serialize");
        assert_eq!(
            json,
            format!(r#"{{"mediaType":"application/json","digest":"sha256:{EMPTY_SHA256}","size":0}}"#)
        );
    }

    #[test]
    fn digest_serializes_as_prefixed_string() {
        let digest = Digest::from_hex(EMPTY_SHA256).expect("valid hex");
        let json = serde_json::to_string(&digest).expect("serialize");
        assert_eq!(json, format!("\"sha256:{EMPTY_SHA256}\""));
        let back: Digest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, digest);
    }
}
