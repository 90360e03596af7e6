//! Graph preprocessing: identifier sanitization, edge aggregation, node set
//! construction and weight bucketing.

use crate::types::{GraphEdge, GraphLayout, GraphNode, GraphRequest};
use dsplot_common::{DsError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Separator reserved by the layout engines; rewritten in node names.
pub const RESERVED_SEPARATOR: char = ':';

/// Replaces the reserved separator with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    name.replace(RESERVED_SEPARATOR, "_")
}

/// Sanitizes every edge endpoint, node-map key and the root node in place.
pub fn sanitize_graph(request: &mut GraphRequest) {
    for edge in &mut request.edges {
        edge.first = sanitize_identifier(&edge.first);
        edge.second = sanitize_identifier(&edge.second);
    }

    if let Some(nodes) = request.nodes.take() {
        // keys that collide after rewriting keep the last entry in key order
        request.nodes = Some(
            nodes
                .into_iter()
                .map(|(name, node)| (sanitize_identifier(&name), node))
                .collect(),
        );
    }

    if let Some(root) = &mut request.root_node {
        *root = sanitize_identifier(root);
    }
}

/// Merges edges with the same ordered `(first, second)` pair, summing their
/// weights. Output keeps first-seen order.
pub fn aggregate_edges(edges: &[GraphEdge]) -> Vec<GraphEdge> {
    let mut positions: HashMap<(&str, &str), usize> = HashMap::with_capacity(edges.len());
    let mut merged: Vec<GraphEdge> = Vec::with_capacity(edges.len());

    for edge in edges {
        let key = (edge.first.as_str(), edge.second.as_str());
        match positions.get(&key) {
            Some(&idx) => merged[idx].weight += edge.weight,
            None => {
                positions.insert(key, merged.len());
                merged.push(edge.clone());
            }
        }
    }

    merged
}

/// Edge endpoints in first-seen order, followed by metadata-only nodes sorted by name.
pub fn node_set(edges: &[GraphEdge], nodes: Option<&BTreeMap<String, GraphNode>>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered: Vec<String> = Vec::new();

    for name in edges.iter().flat_map(|e| [e.first.as_str(), e.second.as_str()]) {
        if seen.insert(name) {
            ordered.push(name.to_string());
        }
    }

    if let Some(nodes) = nodes {
        // BTreeMap iteration is already sorted by name
        for name in nodes.keys() {
            if seen.insert(name.as_str()) {
                ordered.push(name.clone());
            }
        }
    }

    ordered
}

/// Linearly rescales `values` into `[start, end]`.
///
/// Returns `false` and leaves the values untouched when the slice is empty or
/// every value is equal.
pub fn normalize(values: &mut [f64], start: f64, end: f64) -> bool {
    let Some((min, max)) = dsplot_common::finite_bounds(values.iter().copied()) else {
        return false;
    };
    let range = max - min;
    if range == 0.0 {
        return false;
    }

    let target = end - start;
    for value in values.iter_mut() {
        *value = (*value - min) / range * target + start;
    }
    true
}

/// Weight tier of an edge relative to the heaviest edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTier {
    /// Below 30% of the maximum.
    Low,
    /// From 30% up to 70% of the maximum.
    Mid,
    /// 70% of the maximum or more.
    High,
}

impl EdgeTier {
    /// All tiers in legend order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Mid, Self::High];

    /// Legend label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "<30%",
            Self::Mid => "30%-70%",
            Self::High => ">70%",
        }
    }

    /// Position in [`EdgeTier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Mid => 1,
            Self::High => 2,
        }
    }

    fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.3 {
            Self::Low
        } else if ratio < 0.7 {
            Self::Mid
        } else {
            Self::High
        }
    }
}

/// Assigns each weight a tier by its ratio to the maximum weight.
/// A maximum of zero puts every edge in [`EdgeTier::Mid`].
pub fn bucket_edge_weights(weights: &[f64]) -> Vec<EdgeTier> {
    let max = weights.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![EdgeTier::Mid; weights.len()];
    }
    weights.iter().map(|w| EdgeTier::from_ratio(w / max)).collect()
}

/// A sanitized, aggregated graph with its node set resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedGraph {
    /// Aggregated edges in first-seen order.
    pub edges: Vec<GraphEdge>,
    /// Every node to render.
    pub nodes: Vec<String>,
    /// Sanitized node metadata.
    pub metadata: Option<BTreeMap<String, GraphNode>>,
    /// Sanitized root node.
    pub root: Option<String>,
    /// Layout strategy.
    pub layout: GraphLayout,
}

impl PreparedGraph {
    /// Sanitizes and aggregates the request and checks the root node.
    pub fn prepare(request: &GraphRequest) -> Result<Self> {
        let mut request = request.clone();
        sanitize_graph(&mut request);

        let edges = aggregate_edges(&request.edges);
        let nodes = node_set(&edges, request.nodes.as_ref());
        let layout = request.layout();

        match (&request.root_node, layout) {
            (None, GraphLayout::CircularTree) => {
                return Err(DsError::validation_field(
                    "root_node is required for the circular_tree layout",
                    "root_node",
                ));
            }
            (Some(root), _) if !nodes.contains(root) => {
                return Err(DsError::validation_field(
                    format!("root_node '{root}' is not a node of the graph"),
                    "root_node",
                ));
            }
            _ => {}
        }

        Ok(Self {
            edges,
            nodes,
            metadata: request.nodes,
            root: request.root_node,
            layout,
        })
    }

    /// Index of every node in [`PreparedGraph::nodes`].
    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect()
    }

    /// Tier of every edge, in edge order.
    pub fn edge_tiers(&self) -> Vec<EdgeTier> {
        let weights: Vec<f64> = self.edges.iter().map(|e| e.weight).collect();
        bucket_edge_weights(&weights)
    }

    /// Node marker areas in node order.
    ///
    /// Without metadata every node gets `default_size`. With metadata, weights
    /// (1 for nodes without an entry) are normalized into `range`; a degenerate
    /// normalization falls back to `default_size`.
    pub fn node_sizes(&self, range: [f64; 2], default_size: f64) -> Vec<f64> {
        let Some(metadata) = &self.metadata else {
            return vec![default_size; self.nodes.len()];
        };

        let mut sizes: Vec<f64> = self
            .nodes
            .iter()
            .map(|name| metadata.get(name).map_or(1.0, |n| n.weight))
            .collect();

        if normalize(&mut sizes, range[0], range[1]) {
            sizes
        } else {
            vec![default_size; self.nodes.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsplot_common::test_utils::assert_approx_eq;
    use dsplot_common::test_utils::property_testing::{
        edge_triple_strategy, node_name_strategy, weight_strategy,
    };
    use proptest::prelude::*;

    fn edge(a: &str, b: &str, w: f64) -> GraphEdge {
        GraphEdge::new(a, b, w)
    }

    #[test]
    fn test_aggregate_edges_merges_ordered_pairs() {
        let edges = vec![edge("A", "B", 3.0), edge("A", "B", 2.0), edge("B", "C", 5.0)];
        assert_eq!(
            aggregate_edges(&edges),
            vec![edge("A", "B", 5.0), edge("B", "C", 5.0)]
        );
    }

    #[test]
    fn test_aggregate_edges_is_directed() {
        let edges = vec![edge("A", "B", 1.0), edge("B", "A", 1.0)];
        assert_eq!(aggregate_edges(&edges).len(), 2);
    }

    #[test]
    fn test_sanitize_merges_colliding_names() {
        let mut request = GraphRequest::from_edges(vec![edge("a:b", "c", 1.0), edge("a_b", "c", 2.0)]);
        request.root_node = Some("a:b".to_string());
        request.layout = Some(GraphLayout::CircularTree);

        let prepared = PreparedGraph::prepare(&request).unwrap();
        assert_eq!(prepared.edges, vec![edge("a_b", "c", 3.0)]);
        assert_eq!(prepared.root.as_deref(), Some("a_b"));
        assert_eq!(prepared.nodes, vec!["a_b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_node_set_includes_metadata_only_nodes() {
        let edges = vec![edge("b", "a", 1.0)];
        let mut nodes = BTreeMap::new();
        nodes.insert("z".to_string(), GraphNode::default());
        nodes.insert("a".to_string(), GraphNode::default());
        nodes.insert("m".to_string(), GraphNode::default());

        assert_eq!(node_set(&edges, Some(&nodes)), vec!["b", "a", "m", "z"]);
    }

    #[test]
    fn test_circular_tree_requires_root() {
        let mut request = GraphRequest::from_edges(vec![edge("a", "b", 1.0)]);
        request.layout = Some(GraphLayout::CircularTree);
        let err = PreparedGraph::prepare(&request).unwrap_err();
        assert_eq!(err.field(), Some("root_node"));

        request.root_node = Some("missing".to_string());
        assert!(PreparedGraph::prepare(&request).is_err());

        request.root_node = Some("b".to_string());
        assert!(PreparedGraph::prepare(&request).is_ok());
    }

    #[test]
    fn test_normalize() {
        let mut values = vec![1.0, 3.0, 5.0];
        assert!(normalize(&mut values, 1000.0, 5000.0));
        assert_approx_eq(values[0], 1000.0, 1e-9);
        assert_approx_eq(values[1], 3000.0, 1e-9);
        assert_approx_eq(values[2], 5000.0, 1e-9);

        let mut flat = vec![2.0, 2.0];
        assert!(!normalize(&mut flat, 0.0, 1.0));
        assert_eq!(flat, vec![2.0, 2.0]);

        assert!(!normalize(&mut [], 0.0, 1.0));
    }

    #[test]
    fn test_bucket_edge_weights() {
        assert_eq!(
            bucket_edge_weights(&[1.0, 3.0, 6.9, 7.0, 10.0]),
            vec![
                EdgeTier::Low,
                EdgeTier::Mid,
                EdgeTier::Mid,
                EdgeTier::High,
                EdgeTier::High
            ]
        );
        assert_eq!(bucket_edge_weights(&[0.0, 0.0]), vec![EdgeTier::Mid; 2]);
        assert!(bucket_edge_weights(&[]).is_empty());
    }

    #[test]
    fn test_node_sizes() {
        let mut request = GraphRequest::from_edges(vec![edge("a", "b", 1.0), edge("b", "c", 1.0)]);
        let prepared = PreparedGraph::prepare(&request).unwrap();
        assert_eq!(prepared.node_sizes([1000.0, 5000.0], 3000.0), vec![3000.0; 3]);

        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), GraphNode { image: None, weight: 5.0 });
        request.nodes = Some(nodes);
        let prepared = PreparedGraph::prepare(&request).unwrap();
        assert_eq!(
            prepared.node_sizes([1000.0, 5000.0], 3000.0),
            vec![5000.0, 1000.0, 1000.0]
        );

        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), GraphNode::default());
        request.nodes = Some(nodes);
        let prepared = PreparedGraph::prepare(&request).unwrap();
        assert_eq!(prepared.node_sizes([1000.0, 5000.0], 3000.0), vec![3000.0; 3]);
    }

    fn edges_strategy() -> impl Strategy<Value = Vec<GraphEdge>> {
        prop::collection::vec(
            edge_triple_strategy().prop_map(|(a, b, w)| GraphEdge::new(a, b, w)),
            1..40,
        )
    }

    proptest! {
        #[test]
        fn prop_aggregation_unique_pairs_and_total(edges in edges_strategy()) {
            let merged = aggregate_edges(&edges);
            let mut pairs = HashSet::new();
            for e in &merged {
                prop_assert!(pairs.insert((e.first.clone(), e.second.clone())));
            }
            let before: f64 = edges.iter().map(|e| e.weight).sum();
            let after: f64 = merged.iter().map(|e| e.weight).sum();
            prop_assert!((before - after).abs() < 1e-6);
        }

        #[test]
        fn prop_sanitize_idempotent(name in node_name_strategy()) {
            let once = sanitize_identifier(&name);
            prop_assert_eq!(sanitize_identifier(&once), once.clone());
            prop_assert!(!once.contains(RESERVED_SEPARATOR));
        }

        #[test]
        fn prop_normalize_hits_bounds(mut values in prop::collection::vec(-1000.0f64..1000.0, 2..30)) {
            let original = values.clone();
            let changed = normalize(&mut values, 10.0, 20.0);
            if changed {
                let (lo, hi) = dsplot_common::finite_bounds(values.iter().copied()).unwrap();
                prop_assert!((lo - 10.0).abs() < 1e-9);
                prop_assert!((hi - 20.0).abs() < 1e-9);
            } else {
                prop_assert_eq!(values, original);
            }
        }

        #[test]
        fn prop_bucketing_total(weights in prop::collection::vec(weight_strategy(), 0..30)) {
            let tiers = bucket_edge_weights(&weights);
            prop_assert_eq!(tiers.len(), weights.len());
            if weights.iter().all(|w| *w == 0.0) {
                prop_assert!(tiers.iter().all(|t| *t == EdgeTier::Mid));
            }
        }
    }
}
