//! Unified error types for the linkpack workspace.
//!
//! Structural errors come from graph construction and ordering, resolution
//! errors from the build engine, and the remaining variants from the
//! collaborators around it. Only [`LinkpackError::InvalidFormat`] is
//! recoverable: callers treat it as "this file has no links".

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum LinkpackError {
    /// A node with this name is already present in the graph.
    #[error("duplicate node: {name}")]
    DuplicateNode {
        /// Name of the node that was inserted twice.
        name: String,
    },

    /// An edge endpoint does not exist in the graph.
    #[error("node not found: {name}")]
    NodeNotFound {
        /// Name of the missing node.
        name: String,
    },

    /// An edge points back at its own source.
    #[error("node {name} cannot reference itself")]
    SelfReference {
        /// Name of the offending node.
        name: String,
    },

    /// A node already has an edge for this template variable.
    #[error("node {name} already links variable {variable}")]
    DuplicateLink {
        /// Source node of the edge.
        name: String,
        /// Template variable bound twice.
        variable: String,
    },

    /// The link graph contains a cycle.
    #[error("cyclic link detected: {}", cycle.join(" -> "))]
    CycleDetected {
        /// Members of the cycle, in traversal order.
        cycle: Vec<String>,
    },

    /// A dependency descriptor was missing when a node was resolved.
    #[error("node {node} depends on {dependency}, which has not been resolved")]
    UnresolvedDependency {
        /// Node being resolved.
        node: String,
        /// Dependency whose descriptor was absent.
        dependency: String,
    },

    /// An attribute value is outside the supported kinds.
    #[error("attribute {key}: unsupported type {kind}")]
    UnsupportedType {
        /// Attribute key holding the value.
        key: String,
        /// Description of the rejected value kind.
        kind: String,
    },

    /// A parser does not understand this content.
    #[error("invalid format for {name}: {reason}")]
    InvalidFormat {
        /// Workspace name of the rejected content.
        name: String,
        /// Why the parser rejected it.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The registry rejected a request or could not be reached.
    #[error("registry error: {message}")]
    Registry {
        /// Description of the registry failure.
        message: String,
    },

    /// The build was canceled before it completed.
    #[error("build canceled")]
    Canceled,

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl LinkpackError {
    /// Returns `true` when the error only means a parser rejected the content.
    #[must_use]
    pub const fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LinkpackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_every_member() {
        let err = LinkpackError::CycleDetected {
            cycle: vec!["a".into(), "b".into(), "c".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic link detected: a -> b -> c -> a");
    }

    #[test]
    fn only_invalid_format_is_recoverable() {
        let rejected = LinkpackError::InvalidFormat {
            name: "blob.bin".into(),
            reason: "not json".into(),
        };
        assert!(rejected.is_invalid_format());
        assert!(!LinkpackError::Canceled.is_invalid_format());
    }

    #[test]
    fn unresolved_dependency_names_both_nodes() {
        let err = LinkpackError::UnresolvedDependency {
            node: "a.json".into(),
            dependency: "b.json".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.json") && msg.contains("b.json"), "got: {msg}");
    }
}
