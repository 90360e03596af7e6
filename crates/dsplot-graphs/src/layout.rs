//! Node placement for the graph diagram.
//!
//! Every layout returns one position per node of the [`PreparedGraph`], in
//! node order, centered on the origin and scaled so the largest coordinate
//! magnitude is 1.

use crate::preprocess::PreparedGraph;
use crate::types::GraphLayout;
use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use petgraph::graphmap::UnGraphMap;
use std::collections::VecDeque;
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// Position of a node in layout space.
pub type Position = (f64, f64);

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-12;
const SPRING_TIME_STEP: f32 = 0.016;

/// Tunables for the layouts that need them.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    /// Steps of the force-directed simulation.
    pub spring_iterations: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            spring_iterations: 300,
        }
    }
}

impl GraphLayout {
    /// Computes node positions for the prepared graph.
    pub fn positions(self, graph: &PreparedGraph, params: LayoutParams) -> Vec<Position> {
        let positions = match self {
            Self::Circular => circular(graph.nodes.len()),
            Self::Spring => spring(graph, params.spring_iterations),
            Self::Spectral => spectral(graph),
            Self::CircularTree => match graph.root.as_deref() {
                Some(root) => radial_tree(graph, root),
                None => circular(graph.nodes.len()),
            },
        };
        debug!(layout = %self, nodes = graph.nodes.len(), "Computed graph layout");
        rescale(positions)
    }
}

/// Centers positions on their mean and scales the largest magnitude to 1.
pub fn rescale(mut positions: Vec<Position>) -> Vec<Position> {
    if positions.is_empty() {
        return positions;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = positions.len() as f64;
    let (sx, sy) = positions
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    let (mx, my) = (sx / n, sy / n);

    let extent = positions
        .iter()
        .map(|(x, y)| (x - mx).abs().max((y - my).abs()))
        .fold(0.0_f64, f64::max);

    for (x, y) in &mut positions {
        *x -= mx;
        *y -= my;
        if extent > 0.0 {
            *x /= extent;
            *y /= extent;
        }
    }
    positions
}

/// Nodes evenly spaced on the unit circle, starting at angle zero.
#[allow(clippy::cast_precision_loss)]
pub fn circular(n: usize) -> Vec<Position> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

/// Undirected weighted graph over node indices, self loops dropped and
/// parallel edges summed.
fn undirected(graph: &PreparedGraph) -> UnGraphMap<usize, f64> {
    let index = graph.node_index();
    let mut adjacency = UnGraphMap::with_capacity(graph.nodes.len(), graph.edges.len());
    for node in 0..graph.nodes.len() {
        adjacency.add_node(node);
    }
    for edge in &graph.edges {
        let (Some(&a), Some(&b)) = (index.get(edge.first.as_str()), index.get(edge.second.as_str()))
        else {
            continue;
        };
        if a == b {
            continue;
        }
        if let Some(weight) = adjacency.edge_weight_mut(a, b) {
            *weight += edge.weight;
        } else {
            adjacency.add_edge(a, b, edge.weight);
        }
    }
    adjacency
}

/// Force-directed layout seeded from the circular layout.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn spring(graph: &PreparedGraph, iterations: usize) -> Vec<Position> {
    let n = graph.nodes.len();
    let seed = circular(n);
    let radius = 100.0 * (n as f64).sqrt();

    let mut simulation: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
        force_charge: 150.0,
        force_spring: 0.05,
        force_max: 100.0,
        node_speed: 3000.0,
        damping_factor: 0.9,
    });

    let indices: Vec<_> = seed
        .iter()
        .enumerate()
        .map(|(i, (x, y))| {
            simulation.add_node(NodeData {
                x: (x * radius) as f32,
                y: (y * radius) as f32,
                mass: 10.0,
                is_anchor: false,
                user_data: i,
            })
        })
        .collect();

    for (a, b, _) in undirected(graph).all_edges() {
        simulation.add_edge(indices[a], indices[b], EdgeData::default());
    }

    for _ in 0..iterations {
        simulation.update(SPRING_TIME_STEP);
    }

    let mut positions = seed.clone();
    simulation.visit_nodes(|node| {
        positions[node.data.user_data] = (f64::from(node.x()), f64::from(node.y()));
    });

    if positions.iter().all(|(x, y)| x.is_finite() && y.is_finite()) {
        positions
    } else {
        warn!("Spring simulation diverged, using circular layout");
        seed
    }
}

/// Layout from the eigenvectors of the 2nd and 3rd smallest eigenvalues of the
/// weighted graph Laplacian.
fn spectral(graph: &PreparedGraph) -> Vec<Position> {
    let n = graph.nodes.len();
    if n < 3 {
        return circular(n);
    }

    let mut laplacian = vec![vec![0.0; n]; n];
    for (a, b, &w) in undirected(graph).all_edges() {
        laplacian[a][b] -= w;
        laplacian[b][a] -= w;
        laplacian[a][a] += w;
        laplacian[b][b] += w;
    }

    let (values, vectors) = symmetric_eigen(laplacian);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let (ix, iy) = (order[1], order[2]);
    (0..n).map(|row| (vectors[row][ix], vectors[row][iy])).collect()
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose column `k` is the eigenvector of
/// eigenvalue `k`.
pub fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().max(1.0);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        if off <= JACOBI_TOLERANCE * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for row in &mut a {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in &mut v {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

/// Breadth-first rings around `root`; each subtree gets an angular wedge
/// proportional to its leaf count. Unreachable nodes sit on an outer ring.
#[allow(clippy::cast_precision_loss)]
fn radial_tree(graph: &PreparedGraph, root: &str) -> Vec<Position> {
    let n = graph.nodes.len();
    let index = graph.node_index();
    let Some(&root) = index.get(root) else {
        return circular(n);
    };

    let adjacency = undirected(graph);
    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|node| {
            let mut list: Vec<usize> = adjacency.neighbors(node).collect();
            list.sort_unstable();
            list
        })
        .collect();

    // BFS spanning tree
    let mut depth = vec![usize::MAX; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::from([root]);
    depth[root] = 0;
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &neighbours[node] {
            if depth[next] == usize::MAX {
                depth[next] = depth[node] + 1;
                children[node].push(next);
                queue.push_back(next);
            }
        }
    }

    let mut leaves = vec![1usize; n];
    for &node in order.iter().rev() {
        if !children[node].is_empty() {
            leaves[node] = children[node].iter().map(|&c| leaves[c]).sum();
        }
    }

    let mut positions = vec![(0.0, 0.0); n];
    let mut wedges = vec![(0.0, TAU); n];
    for &node in &order {
        let (start, span) = wedges[node];
        if node != root {
            let radius = depth[node] as f64;
            let angle = start + span / 2.0;
            positions[node] = (radius * angle.cos(), radius * angle.sin());
        }
        let total = leaves[node] as f64;
        let mut cursor = start;
        for &child in &children[node] {
            let share = span * leaves[child] as f64 / total;
            wedges[child] = (cursor, share);
            cursor += share;
        }
    }

    let unreachable: Vec<usize> = (0..n).filter(|&i| depth[i] == usize::MAX).collect();
    if !unreachable.is_empty() {
        let outer = order.iter().map(|&i| depth[i]).max().unwrap_or(0) as f64 + 1.0;
        for (slot, (x, y)) in unreachable.iter().zip(circular(unreachable.len())) {
            positions[*slot] = if unreachable.len() == 1 {
                (outer, 0.0)
            } else {
                (x * outer, y * outer)
            };
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphEdge, GraphRequest};

    fn prepared(edges: &[(&str, &str, f64)], layout: GraphLayout, root: Option<&str>) -> PreparedGraph {
        let mut request = GraphRequest::from_edges(
            edges
                .iter()
                .map(|(a, b, w)| GraphEdge::new(*a, *b, *w))
                .collect(),
        );
        request.layout = Some(layout);
        request.root_node = root.map(str::to_string);
        PreparedGraph::prepare(&request).unwrap()
    }

    fn in_unit_box(positions: &[Position]) -> bool {
        positions
            .iter()
            .all(|(x, y)| x.is_finite() && y.is_finite() && x.abs() <= 1.0 + 1e-9 && y.abs() <= 1.0 + 1e-9)
    }

    const CHAIN: &[(&str, &str, f64)] = &[("a", "b", 1.0), ("b", "c", 2.0), ("c", "d", 1.0), ("d", "a", 3.0)];

    #[test]
    fn test_circular_layout() {
        let positions = circular(4);
        assert!((positions[0].0 - 1.0).abs() < 1e-12);
        assert!((positions[1].1 - 1.0).abs() < 1e-12);
        assert_eq!(circular(1), vec![(0.0, 0.0)]);
        assert!(circular(0).is_empty());
    }

    #[test]
    fn test_every_layout_normalized() {
        for layout in [
            GraphLayout::Circular,
            GraphLayout::Spring,
            GraphLayout::Spectral,
            GraphLayout::CircularTree,
        ] {
            let graph = prepared(CHAIN, layout, Some("a"));
            let positions = layout.positions(&graph, LayoutParams::default());
            assert_eq!(positions.len(), 4, "{layout}");
            assert!(in_unit_box(&positions), "{layout}: {positions:?}");
        }
    }

    #[test]
    fn test_spring_is_deterministic() {
        let graph = prepared(CHAIN, GraphLayout::Spring, None);
        let params = LayoutParams { spring_iterations: 50 };
        assert_eq!(
            GraphLayout::Spring.positions(&graph, params),
            GraphLayout::Spring.positions(&graph, params)
        );
    }

    #[test]
    fn test_spectral_small_graph_falls_back() {
        let graph = prepared(&[("a", "b", 1.0)], GraphLayout::Spectral, None);
        let positions = GraphLayout::Spectral.positions(&graph, LayoutParams::default());
        assert_eq!(positions, rescale(circular(2)));
    }

    #[test]
    fn test_undirected_merges_reverse_edges() {
        let graph = prepared(
            &[("a", "b", 1.0), ("b", "a", 2.0), ("a", "a", 5.0)],
            GraphLayout::Circular,
            None,
        );
        let adjacency = undirected(&graph);
        assert_eq!(adjacency.edge_count(), 1);
        assert_eq!(adjacency.edge_weight(0, 1), Some(&3.0));
    }

    #[test]
    fn test_jacobi_diagonalizes() {
        let matrix = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let (mut values, _) = symmetric_eigen(matrix);
        values.sort_by(f64::total_cmp);
        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_radial_tree_root_at_center() {
        let graph = prepared(
            &[("r", "a", 1.0), ("r", "b", 1.0), ("a", "c", 1.0), ("x", "y", 1.0)],
            GraphLayout::CircularTree,
            Some("r"),
        );
        let raw = radial_tree(&graph, "r");
        let index = graph.node_index();
        assert_eq!(raw[index["r"]], (0.0, 0.0));

        let radius = |name: &str| {
            let (x, y) = raw[index[name]];
            x.hypot(y)
        };
        assert!((radius("a") - 1.0).abs() < 1e-9);
        assert!((radius("c") - 2.0).abs() < 1e-9);
        // unreachable pair sits outside the deepest ring
        assert!((radius("x") - 3.0).abs() < 1e-9);
        assert!((radius("y") - 3.0).abs() < 1e-9);
    }
}
