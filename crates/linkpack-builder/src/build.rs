//! Build orchestration over a workspace.
//!
//! A build indexes every file of the source workspace, renders it with the
//! matching parser, attaches configured properties, links files that
//! mention each other by name, resolves the resulting graph, and writes the
//! resolved bytes to the output workspace.

use std::collections::BTreeMap;

use linkpack_attributes::{AttributeSet, Properties};
use linkpack_common::config::BuildConfig;
use linkpack_common::error::{LinkpackError, Result};
use linkpack_common::types::Descriptor;
use linkpack_graph::{Entry, LinkGraph, build_graph};
use linkpack_workspace::{ParserRegistry, Workspace};

use crate::accumulator::DescriptorAccumulator;
use crate::cancel::CancelToken;
use crate::parallel::resolve_parallel;
use crate::resolve::resolve_with_cancel;

/// Tunables of a build.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Worker threads per resolution level; `0` and `1` resolve sequentially.
    pub workers: usize,
    /// Cancellation flag checked between files and between nodes.
    pub cancel: CancelToken,
    /// Parsers used to render workspace files.
    pub parsers: ParserRegistry,
}

/// Result of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Node names in resolution order.
    pub order: Vec<String>,
    /// Descriptors in resolution order.
    pub descriptors: DescriptorAccumulator,
    /// Resolved bytes by node name.
    pub blobs: BTreeMap<String, Vec<u8>>,
}

impl BuildReport {
    /// Resolved bytes of `name`.
    #[must_use]
    pub fn blob(&self, name: &str) -> Option<&[u8]> {
        self.blobs.get(name).map(Vec::as_slice)
    }

    /// Descriptor and bytes of every node, in resolution order.
    pub fn layers(&self) -> impl Iterator<Item = (&Descriptor, &[u8])> {
        self.descriptors
            .iter()
            .filter_map(|(name, descriptor)| self.blob(name).map(|blob| (descriptor, blob)))
    }
}

/// Folds every configuration rule matching `name` into one set of properties.
///
/// Rules apply in declaration order; fields set by a later rule replace
/// those of earlier ones and named sets are merged key by key.
///
/// # Errors
///
/// Returns `LinkpackError::Config` for malformed descriptor or link
/// attributes and `LinkpackError::UnsupportedType` for attribute values
/// outside the supported kinds.
pub fn properties_for(config: &BuildConfig, name: &str) -> Result<Properties> {
    let mut properties = Properties::new();
    for rule in config.rules_for(name) {
        let mut overlay = Properties::new();
        if let Some(value) = &rule.descriptor {
            overlay.descriptor = Some(from_rule_value(&rule.file, "descriptor", value)?);
        }
        if let Some(value) = &rule.link {
            overlay.link = Some(from_rule_value(&rule.file, "link", value)?);
        }
        for (set, entries) in &rule.attributes {
            overlay.insert_set(set.clone(), AttributeSet::from_json(entries)?)?;
        }
        properties.merge(overlay);
    }
    Ok(properties)
}

fn from_rule_value<T: serde::de::DeserializeOwned>(
    file: &str,
    field: &str,
    value: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| LinkpackError::Config {
        message: format!("rule for {file}: invalid {field} attributes: {e}"),
    })
}

/// Reads and renders every file of `source` into graph entries.
///
/// A file no parser accepts keeps its raw bytes and has no links.
///
/// # Errors
///
/// Returns workspace read failures, configuration errors, and
/// `LinkpackError::Canceled` when `options.cancel` is triggered.
pub fn index_workspace(
    source: &dyn Workspace,
    config: &BuildConfig,
    options: &BuildOptions,
) -> Result<Vec<Entry>> {
    let names = source.walk()?;
    let is_known = |candidate: &str| names.binary_search_by(|n| n.as_str().cmp(candidate)).is_ok();

    let mut entries = Vec::with_capacity(names.len());
    for name in &names {
        options.cancel.check()?;
        let raw = source.read(name)?;
        let media_type = options.parsers.detect(name, &raw);
        let (content, links) = match options.parsers.render(name, &raw, &is_known) {
            Ok(rendered) => (rendered.content, rendered.links),
            Err(e) if e.is_invalid_format() => {
                tracing::debug!(name = %name, error = %e, "no links extracted");
                (raw, BTreeMap::new())
            }
            Err(e) => return Err(e),
        };
        entries.push(Entry {
            name: name.clone(),
            content,
            links,
            properties: properties_for(config, name)?,
            media_type: media_type.to_owned(),
        });
    }
    tracing::info!(files = entries.len(), "workspace indexed");
    Ok(entries)
}

/// Indexes `source` and builds its link graph without resolving it.
///
/// # Errors
///
/// Returns the errors of [`index_workspace`] and of graph construction.
pub fn plan_workspace(
    source: &dyn Workspace,
    config: &BuildConfig,
    options: &BuildOptions,
) -> Result<LinkGraph> {
    let graph = build_graph(index_workspace(source, config, options)?)?;
    tracing::info!(
        nodes = graph.len(),
        links = graph.edge_count(),
        "link graph built"
    );
    Ok(graph)
}

/// Builds `source` into `output`.
///
/// Nothing is written unless the whole graph resolves.
///
/// # Errors
///
/// Returns the first fatal error: workspace I/O, configuration, structural
/// graph errors, resolution errors, or `LinkpackError::Canceled`.
pub fn build_workspace(
    source: &dyn Workspace,
    output: &dyn Workspace,
    config: &BuildConfig,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let graph = plan_workspace(source, config, options)?;
    let resolution = if options.workers > 1 {
        resolve_parallel(&graph, options.workers, &options.cancel)?
    } else {
        resolve_with_cancel(&graph, &options.cancel)?
    };

    for (name, node) in resolution.iter() {
        output.write(name, &node.content)?;
        tracing::debug!(node = %name, digest = %node.descriptor.digest, "blob written");
    }

    let report = BuildReport {
        order: resolution.order().to_vec(),
        descriptors: resolution.to_accumulator(),
        blobs: resolution.into_contents(),
    };
    tracing::info!(nodes = report.order.len(), "build complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use linkpack_attributes::AttributeValue;
    use linkpack_workspace::LocalWorkspace;

    use super::*;

    const CONFIG: &str = r#"
files:
  - file: "*.json"
    link:
      registryHint: registry.local
  - file: app.json
    descriptor:
      id: app
      type: service
    attributes:
      build:
        tier: 2
"#;

    #[test]
    fn properties_for_layers_rules_in_order() {
        let config = BuildConfig::from_yaml(CONFIG).expect("config");
        let properties = properties_for(&config, "app.json").expect("properties");
        assert_eq!(properties.link_or_default().registry_hint, "registry.local");
        let descriptor = properties.descriptor.as_ref().expect("descriptor");
        assert_eq!(descriptor.component.id, "app");
        assert_eq!(descriptor.component.kind, "service");
        assert_eq!(
            properties.set("build").and_then(|s| s.get("tier")),
            Some(&AttributeValue::Int(2))
        );

        let other = properties_for(&config, "lib.json").expect("properties");
        assert!(other.descriptor.is_none());
        assert!(properties_for(&config, "notes.txt").expect("none").is_empty());
    }

    #[test]
    fn properties_for_rejects_bad_attribute_values() {
        let config = BuildConfig::from_yaml(
            "files:\n  - file: a.json\n    attributes:\n      s:\n        k: {nested: 1}\n",
        )
        .expect("config");
        assert!(matches!(
            properties_for(&config, "a.json"),
            Err(LinkpackError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn properties_for_rejects_malformed_link() {
        let config =
            BuildConfig::from_yaml("files:\n  - file: a.json\n    link: nope\n").expect("config");
        assert!(matches!(
            properties_for(&config, "a.json"),
            Err(LinkpackError::Config { .. })
        ));
    }

    #[test]
    fn unparseable_files_keep_raw_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = LocalWorkspace::open(dir.path()).expect("open");
        source.write("broken.json", b"{oops").expect("write");
        source.write("note.bin", b"\x00\x01").expect("write");

        let entries =
            index_workspace(&source, &BuildConfig::default(), &BuildOptions::default())
                .expect("index");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "broken.json");
        assert_eq!(entries[0].content, b"{oops");
        assert!(entries[0].links.is_empty());
        assert_eq!(entries[1].content, b"\x00\x01");
    }

    #[test]
    fn build_writes_resolved_files_to_output() {
        let src = tempfile::tempdir().expect("src");
        let out = tempfile::tempdir().expect("out");
        let source = LocalWorkspace::open(src.path()).expect("source");
        let output = LocalWorkspace::open(out.path()).expect("output");
        source.write("a.json", br#"{"dep":"b.json"}"#).expect("a");
        source.write("b.json", br#"{"value":1}"#).expect("b");

        let report = build_workspace(
            &source,
            &output,
            &BuildConfig::default(),
            &BuildOptions::default(),
        )
        .expect("build");
        assert_eq!(report.order, ["b.json", "a.json"]);
        assert_eq!(report.layers().count(), 2);

        let written = output.read("a.json").expect("read");
        assert_eq!(report.blob("a.json"), Some(written.as_slice()));
        let value: serde_json::Value = serde_json::from_slice(&written).expect("json");
        assert_eq!(
            value["dep"]["digest"],
            serde_json::Value::String(
                report.descriptors.get("b.json").expect("b").digest.to_string()
            )
        );
    }

    #[test]
    fn canceled_build_writes_nothing() {
        let src = tempfile::tempdir().expect("src");
        let out = tempfile::tempdir().expect("out");
        let source = LocalWorkspace::open(src.path()).expect("source");
        let output = LocalWorkspace::open(out.path()).expect("output");
        source.write("a.json", b"{}").expect("a");

        let options = BuildOptions::default();
        options.cancel.cancel();
        let err = build_workspace(&source, &output, &BuildConfig::default(), &options)
            .expect_err("canceled");
        assert!(matches!(err, LinkpackError::Canceled));
        assert!(output.walk().expect("walk").is_empty());
    }
}
