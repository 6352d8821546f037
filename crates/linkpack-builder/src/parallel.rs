//! Level-parallel resolution.
//!
//! The topological order is computed first, in a read-only pass. Nodes are
//! then grouped into levels: a node with no dependencies is on level 0, any
//! other node is one level above its highest dependency. Every node of a
//! level only needs descriptors from lower levels, so a level can be split
//! across scoped worker threads. Workers read the descriptors of earlier
//! levels and hand their results back; the coordinating thread is the only
//! writer of the result map.

use std::collections::BTreeMap;

use linkpack_common::error::Result;
use linkpack_graph::LinkGraph;

use crate::cancel::CancelToken;
use crate::resolve::{Resolution, ResolvedNode, resolve_node};

/// Resolves `graph` with up to `workers` threads per level.
///
/// The output is identical to [`resolve`](crate::resolve::resolve).
///
/// # Errors
///
/// Returns the same errors as the sequential resolver, including
/// `LinkpackError::Canceled` when `cancel` is triggered. When several
/// workers fail, the error of the lowest-numbered chunk is returned.
pub fn resolve_parallel(
    graph: &LinkGraph,
    workers: usize,
    cancel: &CancelToken,
) -> Result<Resolution> {
    let order = graph.topological_order()?;
    let levels = levels(graph, &order)?;
    let workers = workers.max(1);
    tracing::info!(
        nodes = order.len(),
        levels = levels.len(),
        workers,
        "parallel resolution planned"
    );

    let mut nodes: BTreeMap<String, ResolvedNode> = BTreeMap::new();
    for level in &levels {
        cancel.check()?;
        let chunk_size = level.len().div_ceil(workers).max(1);
        let done = &nodes;

        let results: Vec<Result<Vec<(String, ResolvedNode)>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = level
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|name| -> Result<(String, ResolvedNode)> {
                                cancel.check()?;
                                let resolved = resolve_node(graph, name, |dep| {
                                    done.get(dep).map(|n| &n.descriptor)
                                })?;
                                Ok((name.clone(), resolved))
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });

        for result in results {
            for (name, resolved) in result? {
                let _ = nodes.insert(name, resolved);
            }
        }
    }
    Ok(Resolution::new(order, nodes))
}

/// Groups `order` into dependency levels, preserving order within a level.
fn levels(graph: &LinkGraph, order: &[String]) -> Result<Vec<Vec<String>>> {
    let mut level_of: BTreeMap<&str, usize> = BTreeMap::new();
    let mut levels: Vec<Vec<String>> = Vec::new();
    for name in order {
        let level = graph
            .dependencies(name)?
            .into_iter()
            .filter_map(|dep| level_of.get(dep).map(|l| l + 1))
            .max()
            .unwrap_or(0);
        let _ = level_of.insert(name.as_str(), level);
        if levels.len() <= level {
            levels.resize_with(level + 1, Vec::new);
        }
        levels[level].push(name.clone());
    }
    Ok(levels)
}
