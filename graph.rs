/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph data structures for the mind-map canvas.
//!
//! Core structures:
//! - `Graph`: main graph container backed by petgraph::StableGraph
//! - `Node`: labeled, colorable node with a position in graph space
//! - `EdgeData`: directed connection payload carrying the derived edge id
//!
//! Boundary: direct mutation methods are `pub(crate)` — callers outside the
//! session reducer path are single-write-path invariant violations.

use euclid::default::{Box2D, Point2D, Size2D};
use log::warn;
use petgraph::Directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

use crate::persistence::types::{
    MapDocument, PersistedColor, PersistedEdge, PersistedNode, PersistedNodeData,
    PersistedPosition, PersistedViewport,
};

/// Stable node handle (petgraph NodeIndex — survives other deletions)
pub type NodeKey = NodeIndex;

/// Stable edge handle (petgraph EdgeIndex)
pub type EdgeKey = EdgeIndex;

/// Default label for the seed node of a map with no stored content.
pub const DEFAULT_ROOT_LABEL: &str = "Central Idea";

/// Default label for nodes created through Tab / drag-to-canvas.
pub const DEFAULT_NODE_LABEL: &str = "New Node";

/// Node color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeColor {
    /// Unset; the renderer falls back to the neutral node style.
    #[default]
    None,
    Red,
    Orange,
    Blue,
    Green,
    Purple,
}

impl From<PersistedColor> for NodeColor {
    fn from(color: PersistedColor) -> Self {
        match color {
            PersistedColor::None => Self::None,
            PersistedColor::Red => Self::Red,
            PersistedColor::Orange => Self::Orange,
            PersistedColor::Blue => Self::Blue,
            PersistedColor::Green => Self::Green,
            PersistedColor::Purple => Self::Purple,
        }
    }
}

impl From<NodeColor> for PersistedColor {
    fn from(color: NodeColor) -> Self {
        match color {
            NodeColor::None => Self::None,
            NodeColor::Red => Self::Red,
            NodeColor::Orange => Self::Orange,
            NodeColor::Blue => Self::Blue,
            NodeColor::Green => Self::Green,
            NodeColor::Purple => Self::Purple,
        }
    }
}

/// Side of the node box a connection handle attaches to.
///
/// Written by the layout engine consistent with the flow direction; render
/// hints only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// A node in the mind map.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable node identity, unique for the life of the session.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Palette color.
    pub color: NodeColor,

    /// Whether this is the map's root node (by convention at most one).
    pub is_root: bool,

    /// Position in graph space (top-left of the node box).
    pub position: Point2D<f32>,

    /// Side outgoing connections leave from.
    pub source_side: HandleSide,

    /// Side incoming connections arrive at.
    pub target_side: HandleSide,
}

impl Node {
    fn new(id: String, label: String, position: Point2D<f32>) -> Self {
        Self {
            id,
            label,
            color: NodeColor::None,
            is_root: false,
            position,
            source_side: HandleSide::Right,
            target_side: HandleSide::Left,
        }
    }
}

/// Edge payload. The id is derived from the endpoint ids at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    pub id: String,
}

/// Derive the deterministic edge id for an ordered endpoint pair.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("e{source}-{target}")
}

/// Read-only view of an edge (built from petgraph edge references)
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub key: EdgeKey,
    pub from: NodeKey,
    pub to: NodeKey,
    pub data: &'a EdgeData,
}

/// Canvas viewport: pan offset plus zoom.
///
/// Ephemeral relative to undo history; saved with the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Convert a screen-space point to graph coordinates.
    pub fn screen_to_graph(&self, point: Point2D<f32>) -> Point2D<f32> {
        Point2D::new((point.x - self.x) / self.zoom, (point.y - self.y) / self.zoom)
    }

    /// Convert a graph-space point to screen coordinates.
    pub fn graph_to_screen(&self, point: Point2D<f32>) -> Point2D<f32> {
        Point2D::new(point.x * self.zoom + self.x, point.y * self.zoom + self.y)
    }
}

impl From<PersistedViewport> for Viewport {
    fn from(viewport: PersistedViewport) -> Self {
        Self {
            x: viewport.x,
            y: viewport.y,
            zoom: if viewport.zoom > 0.0 { viewport.zoom } else { 1.0 },
        }
    }
}

impl From<Viewport> for PersistedViewport {
    fn from(viewport: Viewport) -> Self {
        Self {
            x: viewport.x,
            y: viewport.y,
            zoom: viewport.zoom,
        }
    }
}

/// Main graph structure backed by petgraph::StableGraph
#[derive(Clone)]
pub struct Graph {
    /// The underlying petgraph stable graph
    inner: StableGraph<Node, EdgeData, Directed>,

    /// Stable string id to node mapping.
    id_to_node: HashMap<String, NodeKey>,

    /// Monotonic id allocator, seeded past any numeric id in loaded content.
    next_id: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            id_to_node: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a graph seeded with the default root node at the origin.
    pub fn with_default_root() -> Self {
        let mut graph = Self::new();
        let id = graph.fresh_id();
        let mut node = Node::new(id, DEFAULT_ROOT_LABEL.to_string(), Point2D::zero());
        node.is_root = true;
        graph.insert_node(node);
        graph
    }

    /// Build a graph from a persisted document.
    ///
    /// Edges referencing unknown node ids (structural corruption in
    /// externally-loaded content) are skipped with a warning; the load never
    /// fails on them.
    pub fn from_document(document: &MapDocument) -> Self {
        let mut graph = Self::new();
        for node in &document.nodes {
            if graph.id_to_node.contains_key(&node.id) {
                warn!("Skipping duplicate node id {:?} in loaded content", node.id);
                continue;
            }
            let mut restored = Node::new(
                node.id.clone(),
                node.data.label.clone(),
                Point2D::new(node.position.x, node.position.y),
            );
            restored.color = node.data.color.into();
            restored.is_root = node.data.is_root;
            graph.note_existing_id(&node.id);
            graph.insert_node(restored);
        }
        for edge in &document.edges {
            let (Some(&from), Some(&to)) = (
                graph.id_to_node.get(&edge.source),
                graph.id_to_node.get(&edge.target),
            ) else {
                warn!(
                    "Skipping dangling edge {:?} ({} -> {})",
                    edge.id, edge.source, edge.target
                );
                continue;
            };
            graph.inner.add_edge(
                from,
                to,
                EdgeData {
                    id: edge.id.clone(),
                },
            );
        }
        graph
    }

    /// Serialize nodes and edges into a persisted document.
    pub fn to_document(&self, viewport: Viewport) -> MapDocument {
        let nodes = self
            .inner
            .node_indices()
            .map(|key| {
                let node = &self.inner[key];
                PersistedNode {
                    id: node.id.clone(),
                    position: PersistedPosition {
                        x: node.position.x,
                        y: node.position.y,
                    },
                    data: PersistedNodeData {
                        label: node.label.clone(),
                        color: node.color.into(),
                        is_root: node.is_root,
                    },
                }
            })
            .collect();
        let edges = self
            .inner
            .edge_references()
            .map(|edge| PersistedEdge {
                id: edge.weight().id.clone(),
                source: self.inner[edge.source()].id.clone(),
                target: self.inner[edge.target()].id.clone(),
            })
            .collect();
        MapDocument {
            nodes,
            edges,
            viewport: viewport.into(),
        }
    }

    /// Bump the id allocator past an id observed in loaded content.
    fn note_existing_id(&mut self, id: &str) {
        if let Ok(numeric) = id.parse::<u64>() {
            self.next_id = self.next_id.max(numeric.saturating_add(1));
        }
    }

    /// Allocate a fresh node id, unique for the life of the session.
    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.next_id.to_string();
            self.next_id += 1;
            if !self.id_to_node.contains_key(&id) {
                return id;
            }
        }
    }

    fn insert_node(&mut self, node: Node) -> NodeKey {
        let id = node.id.clone();
        let key = self.inner.add_node(node);
        self.id_to_node.insert(id, key);
        key
    }

    // Single-write-path boundary: graph topology mutators are crate-internal.
    // The session reducer in `app.rs` is the only caller.

    /// Add a child node connected from `parent_id`.
    ///
    /// Returns the new node's key and id, or `None` (no-op) when the parent
    /// is unknown.
    pub(crate) fn add_child(
        &mut self,
        parent_id: &str,
        label: &str,
        position: Point2D<f32>,
    ) -> Option<(NodeKey, String)> {
        let parent_key = *self.id_to_node.get(parent_id)?;
        let id = self.fresh_id();
        let key = self.insert_node(Node::new(id.clone(), label.to_string(), position));
        self.inner.add_edge(
            parent_key,
            key,
            EdgeData {
                id: edge_id(parent_id, &id),
            },
        );
        Some((key, id))
    }

    /// Add a free node at `position` connected from `source_id`.
    ///
    /// Same mechanics as `add_child`; used when the user drags a connection
    /// to empty canvas space.
    pub(crate) fn add_free_node(
        &mut self,
        source_id: &str,
        position: Point2D<f32>,
    ) -> Option<(NodeKey, String)> {
        self.add_child(source_id, DEFAULT_NODE_LABEL, position)
    }

    /// Replace a node's label. Returns false (no-op) on unknown id.
    pub(crate) fn update_label(&mut self, id: &str, label: &str) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace a node's color. Returns false (no-op) on unknown id.
    pub(crate) fn update_color(&mut self, id: &str, color: NodeColor) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.color = color;
                true
            }
            None => false,
        }
    }

    /// Move a node. Returns false (no-op) on unknown id.
    pub(crate) fn set_position(&mut self, key: NodeKey, position: Point2D<f32>) -> bool {
        match self.inner.node_weight_mut(key) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Apply a layout placement: position plus connection-side hints.
    pub(crate) fn apply_placement(
        &mut self,
        id: &str,
        position: Point2D<f32>,
        source_side: HandleSide,
        target_side: HandleSide,
    ) {
        if let Some(node) = self.get_mut(id) {
            node.position = position;
            node.source_side = source_side;
            node.target_side = target_side;
        }
    }

    /// Remove a node and all edges where it is source or target (cascade).
    ///
    /// Returns false (no-op) on unknown id. Removing the last node is
    /// permitted; the graph may become empty.
    pub(crate) fn remove_node(&mut self, id: &str) -> bool {
        let Some(key) = self.id_to_node.remove(id) else {
            return false;
        };
        self.inner.remove_node(key).is_some()
    }

    /// Add a directed edge between two existing nodes.
    ///
    /// Returns `None` (no-op) when either endpoint is unknown. Self-loops and
    /// duplicate edges between the same ordered pair are accepted, not
    /// validated.
    pub(crate) fn connect(&mut self, source_id: &str, target_id: &str) -> Option<EdgeKey> {
        let from = *self.id_to_node.get(source_id)?;
        let to = *self.id_to_node.get(target_id)?;
        Some(self.inner.add_edge(
            from,
            to,
            EdgeData {
                id: edge_id(source_id, target_id),
            },
        ))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        let key = *self.id_to_node.get(id)?;
        self.inner.node_weight_mut(key)
    }

    /// Get a node by string id.
    pub fn get(&self, id: &str) -> Option<&Node> {
        let key = *self.id_to_node.get(id)?;
        self.inner.node_weight(key)
    }

    /// Get a node's key by string id.
    pub fn node_key(&self, id: &str) -> Option<NodeKey> {
        self.id_to_node.get(id).copied()
    }

    /// Get a node by key.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.inner.node_weight(key)
    }

    /// Iterate over all nodes as (key, node) pairs
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.inner
            .node_indices()
            .map(move |key| (key, &self.inner[key]))
    }

    /// Iterate over all edges as EdgeView
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.inner.edge_references().map(|edge| EdgeView {
            key: edge.id(),
            from: edge.source(),
            to: edge.target(),
            data: edge.weight(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Bounding box over all node boxes of the given size.
    ///
    /// Returns `None` for an empty graph.
    pub fn bounding_box(&self, node_size: Size2D<f32>) -> Option<Box2D<f32>> {
        let mut bounds: Option<Box2D<f32>> = None;
        for (_, node) in self.nodes() {
            let node_box = Box2D::new(
                node.position,
                node.position + node_size.to_vector(),
            );
            bounds = Some(match bounds {
                Some(current) => current.union(&node_box),
                None => node_box,
            });
        }
        bounds
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
