//! Bounded simple-path enumeration inside a layer

use super::index::EdgeIndex;
use super::types::{Direction, LayerPath, PathResult};
use crate::cancel::{is_cancelled, CancellationToken};
use crate::graph::{EdgeId, Layer, NodeId, Sign};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Options for [`Layer::find_paths`]
///
/// Anything left unset falls back to the layer: its default depth, its
/// path-count cap and its traversal direction.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    /// Maximum number of edges on a path
    pub max_depth: Option<usize>,
    /// Only follow edges of this sign
    pub sign_filter: Option<Sign>,
    /// Stop after this many paths
    pub max_paths: Option<usize>,
    pub direction: Option<Direction>,
    pub cancel: Option<CancellationToken>,
}

impl PathOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn sign(mut self, sign: Sign) -> Self {
        self.sign_filter = Some(sign);
        self
    }

    pub fn max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = Some(max_paths);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Resolved parameters of one search
struct PathSearch<'a> {
    target: &'a NodeId,
    max_depth: usize,
    max_paths: usize,
    direction: Direction,
    cancel: Option<&'a CancellationToken>,
    index: EdgeIndex<'a>,
}

pub(crate) fn enumerate(
    layer: &Layer,
    from: &NodeId,
    to: &NodeId,
    options: &PathOptions,
) -> PathResult {
    if !layer.contains_node(from) || !layer.contains_node(to) {
        return PathResult::empty();
    }

    let sign_filter = options.sign_filter;
    let search = PathSearch {
        target: to,
        max_depth: options.max_depth.unwrap_or(layer.default_max_depth()),
        max_paths: options.max_paths.unwrap_or(layer.max_paths()),
        direction: options.direction.unwrap_or(layer.traversal()),
        cancel: options.cancel.as_ref(),
        index: EdgeIndex::filtered(layer.edges(), |e| {
            sign_filter.map_or(true, |s| e.sign == s)
        }),
    };
    debug!(
        layer = %layer.name(),
        %from,
        %to,
        max_depth = search.max_depth,
        "enumerating paths"
    );

    let mut result = PathResult::empty();
    if search.max_paths == 0 {
        result.truncated = true;
        return result;
    }

    let mut nodes = vec![from.clone()];
    let mut edges: Vec<EdgeId> = Vec::new();
    let mut on_path: HashSet<NodeId> = HashSet::from([from.clone()]);
    search.walk(from, &mut nodes, &mut edges, &mut on_path, &mut result);

    if result.truncated {
        warn!(layer = %layer.name(), cap = search.max_paths, "path cap reached");
    }
    if result.cancelled {
        warn!(layer = %layer.name(), found = result.paths.len(), "path search cancelled");
    }
    debug!(layer = %layer.name(), found = result.paths.len(), "paths enumerated");
    result
}

impl PathSearch<'_> {
    /// Depth-first step; `on_path` holds the nodes of the current path only
    fn walk(
        &self,
        current: &NodeId,
        nodes: &mut Vec<NodeId>,
        edges: &mut Vec<EdgeId>,
        on_path: &mut HashSet<NodeId>,
        result: &mut PathResult,
    ) {
        if result.truncated || result.cancelled {
            return;
        }
        if is_cancelled(self.cancel) {
            result.cancelled = true;
            return;
        }
        if current == self.target {
            result.paths.push(LayerPath {
                nodes: nodes.clone(),
                edges: edges.clone(),
            });
            if result.paths.len() >= self.max_paths {
                result.truncated = true;
            }
            return;
        }
        if edges.len() >= self.max_depth {
            return;
        }

        for (edge, next) in self.index.steps(current, self.direction) {
            if on_path.contains(next) {
                continue;
            }
            nodes.push(next.clone());
            edges.push(edge.id.clone());
            on_path.insert(next.clone());

            self.walk(next, nodes, edges, on_path, result);

            on_path.remove(next);
            edges.pop();
            nodes.pop();

            if result.truncated || result.cancelled {
                return;
            }
        }
    }
}
