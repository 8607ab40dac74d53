/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Session state management for the mind-map canvas.
//!
//! `MapSession` is the explicit controller object for one open map:
//! constructed on map open, torn down on navigate-away. It owns selection,
//! inline-edit state, the viewport, and the undo/redo log, and it is the
//! single write path into the graph store. User gestures arrive as
//! `SessionIntent` values; state changes are surfaced as drained
//! `SessionEvent`s so renderers and the save pipeline can react in data-flow
//! order.

use euclid::default::{Box2D, Point2D, Size2D, Vector2D};
use log::debug;
use rand::Rng;
use uuid::Uuid;

use crate::graph::{DEFAULT_NODE_LABEL, Graph, NodeColor, NodeKey, Viewport};
use crate::history::HistoryLog;
use crate::layout::{self, LayoutDirection, NODE_HEIGHT, NODE_WIDTH};
use crate::persistence::types::MapDocument;
use crate::persistence::{SavePipeline, SaveStatus};
use crate::store::{MapRecord, MetaPatch};

/// Zoom bounds enforced on viewport updates.
pub const ZOOM_MIN: f32 = 0.1;
pub const ZOOM_MAX: f32 = 10.0;

/// Horizontal offset of a Tab-created child from its parent.
const CHILD_OFFSET_X: f32 = 200.0;

/// Vertical jitter range for Tab-created children. Intentionally random to
/// reduce exact overlaps; there is no collision avoidance.
const CHILD_JITTER_Y: f32 = 50.0;

/// Default canvas extent assumed until the host reports a real one.
const DEFAULT_CANVAS_SIZE: Size2D<f32> = Size2D::new(1280.0, 720.0);

/// User-gesture-level commands applied by the session reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionIntent {
    /// Click on a node.
    SelectNode { key: NodeKey },
    /// Click on empty canvas.
    ClearSelection,
    /// Double-click on a node: enter inline label editing.
    BeginLabelEdit { key: NodeKey },
    /// Commit from a node's edit widget (Enter, or blur with a changed
    /// value). A value identical to the current label is a no-op.
    CommitLabelEdit { node_id: String, label: String },
    /// Escape or blur without change.
    CancelLabelEdit,
    /// Tab: add a child under the selected node.
    AddChildToSelection,
    /// Backspace/Delete: remove the selected node and its edges.
    DeleteSelection,
    /// Connection handle dragged from a node and released over another node.
    ConnectNodes { source: NodeKey, target: NodeKey },
    /// Connection handle released over empty canvas: create a node there.
    ConnectionDropOnCanvas {
        source: NodeKey,
        screen_position: Point2D<f32>,
    },
    /// Palette selection for the selected node.
    SetNodeColor { color: NodeColor },
    /// Continuous node drag update; not a history point on its own.
    SetNodePosition {
        key: NodeKey,
        position: Point2D<f32>,
    },
    /// Drag release: commits the whole drag as one history entry.
    FinishNodeDrag,
    /// Explicit auto-layout trigger.
    ApplyAutoLayout { direction: LayoutDirection },
    Undo,
    Redo,
    /// Pan/zoom update. Ephemeral: not undoable, not a save trigger.
    SetViewport { viewport: Viewport },
    /// Title edit committed on blur/Enter; persists immediately.
    RenameMap { title: String },
}

/// Change notifications drained by the host after applying intents.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Nodes or edges changed; renderers should rebuild and the document has
    /// been forwarded to the save pipeline.
    ContentChanged,
    SelectionChanged,
    ViewportChanged,
    TitleChanged,
    /// Undo/redo replaced the whole graph.
    HistoryRestored,
    /// Auto-layout ran; carries the new content bounding box.
    LayoutApplied { bounds: Box2D<f32> },
}

/// Inline label editing state for a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineEdit {
    pub key: NodeKey,
    pub node_id: String,
    /// Label at edit start; commits compare against the current label, this
    /// is kept for hosts that restore the widget on cancel.
    pub original: String,
}

/// One open map: graph, selection, history, viewport, save wiring.
pub struct MapSession {
    map_id: Uuid,
    title: String,

    /// Canonical graph state. Read freely; mutate only through intents.
    pub graph: Graph,

    viewport: Viewport,
    canvas_size: Size2D<f32>,
    selection: Option<NodeKey>,
    inline_edit: Option<InlineEdit>,
    history: HistoryLog,
    events: Vec<SessionEvent>,
    pipeline: Option<SavePipeline>,
    drag_in_progress: bool,
}

impl MapSession {
    /// Open a session over a loaded map record.
    ///
    /// A record with no stored content seeds the default root node; a record
    /// whose content lists zero nodes opens empty.
    pub fn open(record: MapRecord) -> Self {
        let (graph, viewport) = match &record.content {
            Some(document) => (
                Graph::from_document(document),
                Viewport::from(document.viewport),
            ),
            None => (Graph::with_default_root(), Viewport::default()),
        };
        let history = HistoryLog::seeded(&graph);
        Self {
            map_id: record.id,
            title: record.title,
            graph,
            viewport,
            canvas_size: DEFAULT_CANVAS_SIZE,
            selection: None,
            inline_edit: None,
            history,
            events: Vec::new(),
            pipeline: None,
            drag_in_progress: false,
        }
    }

    /// Attach the save pipeline. Until attached, edits stay local.
    pub fn attach_pipeline(&mut self, pipeline: SavePipeline) {
        self.pipeline = Some(pipeline);
    }

    /// Tear the session down, flushing any pending debounced save first.
    pub fn close(mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.flush();
            // Worker drains the flush before observing the cancellation.
            pipeline.close();
        }
    }

    pub fn map_id(&self) -> Uuid {
        self.map_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> Option<NodeKey> {
        self.selection
    }

    /// Selected node's id, when a node is selected.
    pub fn selected_node_id(&self) -> Option<&str> {
        let key = self.selection?;
        self.graph.node(key).map(|node| node.id.as_str())
    }

    /// True when toolbar color/add-child controls should be enabled.
    pub fn can_edit_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn inline_edit(&self) -> Option<&InlineEdit> {
        self.inline_edit.as_ref()
    }

    /// True while a text field owns the keyboard (inline label editing).
    /// Keyboard shortcuts must be suppressed in this state.
    pub fn text_field_focused(&self) -> bool {
        self.inline_edit.is_some()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_cursor(&self) -> usize {
        self.history.cursor()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Current save indicator state; `Idle` when no pipeline is attached.
    pub fn save_status(&self) -> SaveStatus {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.status())
            .unwrap_or(SaveStatus::Idle)
    }

    /// Host-reported canvas extent, used for viewport recentering.
    pub fn set_canvas_size(&mut self, size: Size2D<f32>) {
        if size.width > 0.0 && size.height > 0.0 {
            self.canvas_size = size;
        }
    }

    /// Serialize the current graph + viewport as the persisted document.
    pub fn document(&self) -> MapDocument {
        self.graph.to_document(self.viewport)
    }

    /// Drain accumulated change events.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = SessionIntent>,
    {
        for intent in intents {
            self.apply_intent(intent);
        }
    }

    pub fn apply_intent(&mut self, intent: SessionIntent) {
        match intent {
            SessionIntent::SelectNode { key } => {
                if self.graph.node(key).is_none() {
                    debug!("Ignoring selection of unknown node {key:?}");
                    return;
                }
                if self.selection != Some(key) {
                    self.selection = Some(key);
                    self.events.push(SessionEvent::SelectionChanged);
                }
            }
            SessionIntent::ClearSelection => {
                if self.selection.take().is_some() {
                    self.events.push(SessionEvent::SelectionChanged);
                }
            }
            SessionIntent::BeginLabelEdit { key } => {
                let Some(node) = self.graph.node(key) else {
                    debug!("Ignoring label edit on unknown node {key:?}");
                    return;
                };
                self.inline_edit = Some(InlineEdit {
                    key,
                    node_id: node.id.clone(),
                    original: node.label.clone(),
                });
            }
            SessionIntent::CommitLabelEdit { node_id, label } => {
                self.inline_edit = None;
                let unchanged = self
                    .graph
                    .get(&node_id)
                    .is_none_or(|node| node.label == label);
                if unchanged {
                    return;
                }
                if self.graph.update_label(&node_id, &label) {
                    self.commit_edit();
                }
            }
            SessionIntent::CancelLabelEdit => {
                self.inline_edit = None;
            }
            SessionIntent::AddChildToSelection => {
                let Some(parent_id) = self.selected_node_id().map(str::to_string) else {
                    return;
                };
                let Some(parent) = self.graph.get(&parent_id) else {
                    return;
                };
                let jitter = rand::thread_rng().gen_range(-CHILD_JITTER_Y..=CHILD_JITTER_Y);
                let position = parent.position + Vector2D::new(CHILD_OFFSET_X, jitter);
                if self
                    .graph
                    .add_child(&parent_id, DEFAULT_NODE_LABEL, position)
                    .is_some()
                {
                    self.commit_edit();
                }
            }
            SessionIntent::DeleteSelection => {
                let Some(node_id) = self.selected_node_id().map(str::to_string) else {
                    return;
                };
                if self.graph.remove_node(&node_id) {
                    self.selection = None;
                    self.events.push(SessionEvent::SelectionChanged);
                    self.commit_edit();
                }
            }
            SessionIntent::ConnectNodes { source, target } => {
                let (Some(source_id), Some(target_id)) = (
                    self.graph.node(source).map(|node| node.id.clone()),
                    self.graph.node(target).map(|node| node.id.clone()),
                ) else {
                    debug!("Ignoring connect between unknown nodes");
                    return;
                };
                if self.graph.connect(&source_id, &target_id).is_some() {
                    self.commit_edit();
                }
            }
            SessionIntent::ConnectionDropOnCanvas {
                source,
                screen_position,
            } => {
                let Some(source_id) = self.graph.node(source).map(|node| node.id.clone()) else {
                    debug!("Ignoring canvas drop from unknown node");
                    return;
                };
                let position = self.viewport.screen_to_graph(screen_position);
                if self.graph.add_free_node(&source_id, position).is_some() {
                    self.commit_edit();
                }
            }
            SessionIntent::SetNodeColor { color } => {
                let Some(node_id) = self.selected_node_id().map(str::to_string) else {
                    return;
                };
                if self.graph.update_color(&node_id, color) {
                    self.commit_edit();
                }
            }
            SessionIntent::SetNodePosition { key, position } => {
                if self.graph.set_position(key, position) {
                    self.drag_in_progress = true;
                    self.note_content_changed();
                }
            }
            SessionIntent::FinishNodeDrag => {
                if self.drag_in_progress {
                    self.drag_in_progress = false;
                    self.history.record(&self.graph);
                }
            }
            SessionIntent::ApplyAutoLayout { direction } => {
                if self.graph.is_empty() {
                    return;
                }
                let result = layout::layout(&self.graph, direction);
                for (id, placement) in &result.placements {
                    self.graph.apply_placement(
                        id,
                        placement.position,
                        placement.source_side,
                        placement.target_side,
                    );
                }
                // Recenter before notifying so the saved document carries the
                // new viewport; history snapshots exclude it either way.
                self.center_viewport_on(result.bounds);
                self.commit_edit();
                self.events
                    .push(SessionEvent::LayoutApplied { bounds: result.bounds });
            }
            SessionIntent::Undo => {
                if let Some(snapshot) = self.history.undo() {
                    self.graph = snapshot.clone();
                    self.after_history_restore();
                }
            }
            SessionIntent::Redo => {
                if let Some(snapshot) = self.history.redo() {
                    self.graph = snapshot.clone();
                    self.after_history_restore();
                }
            }
            SessionIntent::SetViewport { viewport } => {
                let clamped = Viewport {
                    x: viewport.x,
                    y: viewport.y,
                    zoom: viewport.zoom.clamp(ZOOM_MIN, ZOOM_MAX),
                };
                if clamped != self.viewport {
                    self.viewport = clamped;
                    self.events.push(SessionEvent::ViewportChanged);
                }
            }
            SessionIntent::RenameMap { title } => {
                if title == self.title {
                    return;
                }
                self.title = title.clone();
                self.events.push(SessionEvent::TitleChanged);
                if let Some(pipeline) = &self.pipeline {
                    pipeline.update_meta(MetaPatch::title(title));
                }
            }
        }
    }

    /// One user-intent-complete edit: record history, then notify.
    fn commit_edit(&mut self) {
        self.history.record(&self.graph);
        self.note_content_changed();
    }

    fn note_content_changed(&mut self) {
        self.events.push(SessionEvent::ContentChanged);
        if let Some(pipeline) = &self.pipeline {
            pipeline.notify_content(self.graph.to_document(self.viewport));
        }
    }

    fn after_history_restore(&mut self) {
        // Selection may point at a node absent from the restored snapshot.
        if let Some(key) = self.selection
            && self.graph.node(key).is_none()
        {
            self.selection = None;
            self.events.push(SessionEvent::SelectionChanged);
        }
        self.inline_edit = None;
        self.events.push(SessionEvent::HistoryRestored);
        self.note_content_changed();
    }

    /// Recenter the viewport on a content bounding box, preserving zoom.
    fn center_viewport_on(&mut self, bounds: Box2D<f32>) {
        let center = bounds.center();
        self.viewport = Viewport {
            x: self.canvas_size.width / 2.0 - center.x * self.viewport.zoom,
            y: self.canvas_size.height / 2.0 - center.y * self.viewport.zoom,
            zoom: self.viewport.zoom,
        };
        self.events.push(SessionEvent::ViewportChanged);
    }

    /// Content bounding box using the layout node box size.
    pub fn content_bounds(&self) -> Option<Box2D<f32>> {
        self.graph.bounding_box(Size2D::new(NODE_WIDTH, NODE_HEIGHT))
    }
}
