//! Build configuration model.
//!
//! A configuration file assigns metadata to workspace files by pattern:
//!
//! ```yaml
//! files:
//!   - file: "*.json"
//!     attributes:
//!       custom:
//!         animal: fish
//!   - file: manifests/app.json
//!     descriptor:
//!       id: app
//!       version: "1.0"
//!     link:
//!       registryHint: localhost:5000
//!       transitive: true
//! ```
//!
//! Values are kept as raw JSON here; the builder converts them into typed
//! attribute sets and reports unsupported kinds at that point.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LinkpackError, Result};

/// Root configuration for a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Per-file metadata rules, applied in declaration order.
    #[serde(default)]
    pub files: Vec<FileRule>,
}

/// Metadata assigned to every workspace file matching `file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRule {
    /// Exact workspace path or a pattern where `*` matches any run of characters.
    pub file: String,
    /// Descriptor attributes (component identity) in their JSON form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<serde_json::Value>,
    /// Link attributes in their JSON form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<serde_json::Value>,
    /// Named attribute sets.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl FileRule {
    /// Returns `true` if this rule applies to the given workspace name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        wildcard_match(&self.file, name)
    }
}

impl BuildConfig {
    /// Parses a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Config` if the text is not a valid configuration.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| LinkpackError::Config {
            message: e.to_string(),
        })
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LinkpackError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&text)
    }

    /// Returns the rules matching `name`, in declaration order.
    pub fn rules_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileRule> + 'a {
        self.files.iter().filter(move |rule| rule.matches(name))
    }
}

/// Matches `name` against a pattern where `*` stands for any (possibly empty) run.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return name.is_empty();
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
