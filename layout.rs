/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Hierarchical layered layout for the mind-map canvas.
//!
//! Sugiyama-style pipeline: break cycles by ignoring DFS back-edges, assign
//! longest-path ranks, order within ranks by barycenter sweeps, then place
//! nodes on a fixed grid of node boxes. The whole pass is a pure function of
//! `(nodes, edges, direction)` and is deterministic: identical input always
//! yields identical output positions.
//!
//! Cycles are never rejected: back-edges simply stop constraining ranks.
//! Disconnected nodes get their own rank-0 entries and distinct slots, so
//! every node ends up with a valid, non-overlapping position.

use euclid::default::{Box2D, Point2D, Size2D, Vector2D};
use std::collections::{BTreeSet, HashSet};

use crate::graph::{Graph, HandleSide};

/// Logical node box width.
pub const NODE_WIDTH: f32 = 150.0;

/// Logical node box height.
pub const NODE_HEIGHT: f32 = 50.0;

/// Gap between neighboring nodes within a rank.
pub const NODE_SEPARATION: f32 = 50.0;

/// Gap between consecutive ranks.
pub const RANK_SEPARATION: f32 = 50.0;

/// Flow direction of the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutDirection {
    /// Ranks grow to the right; children sit right of their parents.
    #[default]
    LeftRight,
    /// Ranks grow downward.
    TopBottom,
}

impl LayoutDirection {
    /// Connection-side hints consistent with the flow direction, as
    /// `(source_side, target_side)`.
    pub fn handle_sides(self) -> (HandleSide, HandleSide) {
        match self {
            Self::LeftRight => (HandleSide::Right, HandleSide::Left),
            Self::TopBottom => (HandleSide::Bottom, HandleSide::Top),
        }
    }
}

/// Computed placement for a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// New position (top-left of the node box) in graph coordinates.
    pub position: Point2D<f32>,
    pub source_side: HandleSide,
    pub target_side: HandleSide,
}

/// Result of a layout pass over the full graph.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// One placement per node, ordered by node id.
    pub placements: Vec<(String, Placement)>,
    /// Bounding box over all placed node boxes.
    pub bounds: Box2D<f32>,
}

/// Sort key giving numeric ids numeric order ("2" before "10") and falling
/// back to lexicographic order for non-numeric ids.
fn id_sort_key(id: &str) -> (u8, u64, &str) {
    match id.parse::<u64>() {
        Ok(numeric) => (0, numeric, ""),
        Err(_) => (1, 0, id),
    }
}

struct LayoutGraph {
    ids: Vec<String>,
    /// Outgoing constraint adjacency (deduped, self-loops dropped, sorted).
    out: Vec<Vec<usize>>,
    /// Incoming constraint adjacency.
    incoming: Vec<Vec<usize>>,
    roots_flagged: Vec<usize>,
}

fn build_layout_graph(graph: &Graph) -> LayoutGraph {
    let mut ids: Vec<String> = graph.nodes().map(|(_, node)| node.id.clone()).collect();
    ids.sort_by(|a, b| id_sort_key(a).cmp(&id_sort_key(b)));

    let index_of = |id: &str| ids.iter().position(|candidate| candidate == id);

    let mut edge_set: BTreeSet<(usize, usize)> = BTreeSet::new();
    for edge in graph.edges() {
        let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
            continue;
        };
        let (Some(u), Some(v)) = (index_of(&from.id), index_of(&to.id)) else {
            continue;
        };
        if u == v {
            // Self-loops never constrain ranking.
            continue;
        }
        edge_set.insert((u, v));
    }

    let mut out = vec![Vec::new(); ids.len()];
    let mut incoming = vec![Vec::new(); ids.len()];
    for &(u, v) in &edge_set {
        out[u].push(v);
        incoming[v].push(u);
    }

    let roots_flagged = ids
        .iter()
        .enumerate()
        .filter(|(_, id)| graph.get(id.as_str()).is_some_and(|node| node.is_root))
        .map(|(index, _)| index)
        .collect();

    LayoutGraph {
        ids,
        out,
        incoming,
        roots_flagged,
    }
}

/// DFS from roots marking back-edges; returns (back_edges, discovery_index).
fn break_cycles(lg: &LayoutGraph) -> (HashSet<(usize, usize)>, Vec<usize>) {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let count = lg.ids.len();
    let mut color = vec![WHITE; count];
    let mut discovery = vec![0usize; count];
    let mut next_discovery = 0usize;
    let mut back_edges = HashSet::new();

    // Start order: declared roots first, then zero-in-degree nodes, then any
    // remaining (cycle-only components), each group in id order.
    let mut start_order: Vec<usize> = lg.roots_flagged.clone();
    start_order.extend((0..count).filter(|&index| lg.incoming[index].is_empty()));
    start_order.extend(0..count);

    let mut stack: Vec<(usize, usize)> = Vec::new();
    for start in start_order {
        if color[start] != WHITE {
            continue;
        }
        color[start] = GRAY;
        discovery[start] = next_discovery;
        next_discovery += 1;
        stack.push((start, 0));

        while let Some(&mut (node, ref mut cursor)) = stack.last_mut() {
            if *cursor < lg.out[node].len() {
                let next = lg.out[node][*cursor];
                *cursor += 1;
                match color[next] {
                    WHITE => {
                        color[next] = GRAY;
                        discovery[next] = next_discovery;
                        next_discovery += 1;
                        stack.push((next, 0));
                    }
                    GRAY => {
                        back_edges.insert((node, next));
                    }
                    // Forward/cross edges stay as rank constraints.
                    _ => {}
                }
            } else {
                color[node] = BLACK;
                stack.pop();
            }
        }
    }

    (back_edges, discovery)
}

/// Longest-path ranks over the constraint DAG (back-edges excluded).
fn assign_ranks(lg: &LayoutGraph, back_edges: &HashSet<(usize, usize)>) -> Vec<usize> {
    let count = lg.ids.len();
    let mut in_degree = vec![0usize; count];
    for (u, targets) in lg.out.iter().enumerate() {
        for &v in targets {
            if !back_edges.contains(&(u, v)) {
                in_degree[v] += 1;
            }
        }
    }

    let mut rank = vec![0usize; count];
    let mut ready: BTreeSet<usize> = (0..count).filter(|&v| in_degree[v] == 0).collect();
    let mut processed = 0usize;
    while let Some(&node) = ready.iter().next() {
        ready.remove(&node);
        processed += 1;
        for &next in &lg.out[node] {
            if back_edges.contains(&(node, next)) {
                continue;
            }
            rank[next] = rank[next].max(rank[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }
    debug_assert_eq!(processed, count, "cycle survived back-edge removal");

    rank
}

/// Group nodes into rank layers, initially ordered by DFS discovery.
fn build_layers(count: usize, rank: &[usize], discovery: &[usize]) -> Vec<Vec<usize>> {
    let max_rank = rank.iter().copied().max().unwrap_or(0);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for node in 0..count {
        layers[rank[node]].push(node);
    }
    for layer in &mut layers {
        layer.sort_by_key(|&node| discovery[node]);
    }
    layers
}

/// Two barycenter sweeps (down, then up) to reduce crossings within layers.
///
/// Neighbor slots are taken from the neighbor's own layer, which is a
/// simplification of the classic adjacent-rank formulation but keeps the
/// pass deterministic and crossing-aware for the small graphs this engine
/// targets.
fn order_layers(lg: &LayoutGraph, layers: &mut [Vec<usize>], rank: &[usize]) {
    let count = lg.ids.len();
    let mut slot = vec![0usize; count];
    let refresh_slots = |layers: &[Vec<usize>], slot: &mut [usize]| {
        for layer in layers {
            for (index, &node) in layer.iter().enumerate() {
                slot[node] = index;
            }
        }
    };
    refresh_slots(layers, &mut slot);

    let sweep = |layers: &mut [Vec<usize>], slot: &mut [usize], downward: bool| {
        let layer_count = layers.len();
        let order: Vec<usize> = if downward {
            (1..layer_count).collect()
        } else {
            (0..layer_count.saturating_sub(1)).rev().collect()
        };
        for layer_index in order {
            let mut keyed: Vec<(f32, usize, usize)> = layers[layer_index]
                .iter()
                .enumerate()
                .map(|(current, &node)| {
                    let neighbors = if downward {
                        &lg.incoming[node]
                    } else {
                        &lg.out[node]
                    };
                    let relevant: Vec<usize> = neighbors
                        .iter()
                        .copied()
                        .filter(|&other| {
                            if downward {
                                rank[other] < layer_index
                            } else {
                                rank[other] > layer_index
                            }
                        })
                        .collect();
                    let barycenter = if relevant.is_empty() {
                        current as f32
                    } else {
                        relevant.iter().map(|&other| slot[other] as f32).sum::<f32>()
                            / relevant.len() as f32
                    };
                    (barycenter, current, node)
                })
                .collect();
            keyed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            layers[layer_index] = keyed.into_iter().map(|(_, _, node)| node).collect();
            for (index, &node) in layers[layer_index].iter().enumerate() {
                slot[node] = index;
            }
        }
    };

    sweep(layers, &mut slot, true);
    sweep(layers, &mut slot, false);
}

/// Compute a deterministic layered layout over the full graph.
pub fn layout(graph: &Graph, direction: LayoutDirection) -> LayoutResult {
    let lg = build_layout_graph(graph);
    if lg.ids.is_empty() {
        return LayoutResult {
            placements: Vec::new(),
            bounds: Box2D::zero(),
        };
    }

    let (back_edges, discovery) = break_cycles(&lg);
    let rank = assign_ranks(&lg, &back_edges);
    let mut layers = build_layers(lg.ids.len(), &rank, &discovery);
    order_layers(&lg, &mut layers, &rank);

    let (source_side, target_side) = direction.handle_sides();
    let half_node = Vector2D::new(NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0);
    let node_size = Size2D::new(NODE_WIDTH, NODE_HEIGHT);

    let mut positions: Vec<Option<Point2D<f32>>> = vec![None; lg.ids.len()];
    for (rank_index, layer) in layers.iter().enumerate() {
        let occupancy = layer.len() as f32;
        for (slot_index, &node) in layer.iter().enumerate() {
            let cross = slot_index as f32 - (occupancy - 1.0) / 2.0;
            let center = match direction {
                LayoutDirection::LeftRight => Point2D::new(
                    rank_index as f32 * (NODE_WIDTH + RANK_SEPARATION) + NODE_WIDTH / 2.0,
                    cross * (NODE_HEIGHT + NODE_SEPARATION),
                ),
                LayoutDirection::TopBottom => Point2D::new(
                    cross * (NODE_WIDTH + NODE_SEPARATION),
                    rank_index as f32 * (NODE_HEIGHT + RANK_SEPARATION) + NODE_HEIGHT / 2.0,
                ),
            };
            positions[node] = Some(center - half_node);
        }
    }

    let mut bounds: Option<Box2D<f32>> = None;
    let mut placements = Vec::with_capacity(lg.ids.len());
    for (index, id) in lg.ids.iter().enumerate() {
        let position = positions[index].expect("every node is placed");
        let node_box = Box2D::new(position, position + node_size.to_vector());
        bounds = Some(match bounds {
            Some(current) => current.union(&node_box),
            None => node_box,
        });
        placements.push((
            id.clone(),
            Placement {
                position,
                source_side,
                target_side,
            },
        ));
    }

    LayoutResult {
        placements,
        bounds: bounds.unwrap_or_else(Box2D::zero),
    }
}
