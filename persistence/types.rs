/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for map persistence.
//!
//! These mirror the in-memory model in `graph.rs`. The persisted unit is one
//! JSON document per map (`{nodes, edges, viewport}`), overwritten wholesale
//! on every save.

use serde::{Deserialize, Deserializer, Serialize};

/// Node color for persistence (mirrors `NodeColor` in the graph model).
///
/// Unknown color strings in externally-loaded content fall back to `None`
/// rather than rejecting the document.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistedColor {
    #[default]
    None,
    Red,
    Orange,
    Blue,
    Green,
    Purple,
}

impl<'de> Deserialize<'de> for PersistedColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "red" => Self::Red,
            "orange" => Self::Orange,
            "blue" => Self::Blue,
            "green" => Self::Green,
            "purple" => Self::Purple,
            _ => Self::None,
        })
    }
}

/// Node position in graph coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct PersistedPosition {
    pub x: f32,
    pub y: f32,
}

/// Label/color/root payload of a persisted node.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNodeData {
    pub label: String,
    #[serde(default)]
    pub color: PersistedColor,
    #[serde(default)]
    pub is_root: bool,
}

/// Persisted node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedNode {
    /// Stable node identity, unique within the map.
    pub id: String,
    pub position: PersistedPosition,
    pub data: PersistedNodeData,
}

/// Persisted edge. `id` is derived as `"e<source>-<target>"` at creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Persisted viewport. Not part of undo history, but saved with the document.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PersistedViewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for PersistedViewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Full map document: the atomic unit of save.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MapDocument {
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub edges: Vec<PersistedEdge>,
    #[serde(default)]
    pub viewport: PersistedViewport,
}

impl MapDocument {
    /// True when the document carries no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
