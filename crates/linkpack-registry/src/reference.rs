//! Destination references: `registry/repository[:tag]`.

use std::fmt;
use std::str::FromStr;

use linkpack_common::constants::DEFAULT_TAG;
use linkpack_common::error::{LinkpackError, Result};

/// A parsed push destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    registry: String,
    repository: String,
    tag: String,
}

impl Reference {
    /// Registry host, with port if one was given.
    #[must_use]
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Repository path inside the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag, `latest` when the reference omitted one.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl FromStr for Reference {
    type Err = LinkpackError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| LinkpackError::Config {
            message: format!("invalid reference {s}: {reason}"),
        };

        let (registry, rest) = s
            .split_once('/')
            .ok_or_else(|| invalid("expected registry/repository[:tag]"))?;
        if registry.is_empty() {
            return Err(invalid("empty registry"));
        }

        let (repository, tag) = match rest.rsplit_once(':') {
            Some((repository, tag)) if !tag.contains('/') => (repository, tag),
            _ => (rest, DEFAULT_TAG),
        };
        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("empty repository path component"));
        }
        if repository.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(invalid("repository must be lowercase"));
        }
        if tag.is_empty() || tag.contains('@') {
            return Err(invalid("bad tag"));
        }

        Ok(Self {
            registry: registry.to_owned(),
            repository: repository.to_owned(),
            tag: tag.to_owned(),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}
