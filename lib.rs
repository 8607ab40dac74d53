/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Mindcanvas: the client-side engine of an interactive mind-mapping canvas.
//!
//! A user builds a directed graph of labeled, colorable nodes, edits them in
//! place, undoes/redoes changes, auto-arranges the graph, and has the result
//! persisted transparently. This crate owns the parts with real state-machine
//! and algorithmic weight; rendering is left to a host (egui, iced, web, ...)
//! that feeds input events in and draws from session state.
//!
//! Components, leaves first:
//! - [`graph`]: the canonical in-memory node/edge store and viewport model
//! - [`history`]: snapshot undo/redo log with a cursor
//! - [`layout`]: deterministic hierarchical layered layout
//! - [`app`]: the per-map session — selection, inline editing, intent reducer
//! - [`input`]: keyboard/pointer/edit-widget translation into intents
//! - [`persistence`]: the debounced save pipeline and document types
//! - [`store`]: the map record store contract plus memory/redb backends
//! - [`preview`]: low-resolution PNG previews for map thumbnails
//!
//! Data flow: input translation -> `SessionIntent` -> reducer mutates the
//! graph -> history records each user-complete edit -> content changes flow,
//! debounced, into the save pipeline -> `MapStore`.

pub mod app;
pub mod graph;
pub mod history;
pub mod input;
pub mod layout;
pub mod persistence;
pub mod preview;
pub mod store;

pub use app::{InlineEdit, MapSession, SessionEvent, SessionIntent};
pub use graph::{EdgeData, Graph, HandleSide, Node, NodeColor, NodeKey, Viewport};
pub use history::HistoryLog;
pub use layout::{LayoutDirection, LayoutResult, Placement};
pub use persistence::types::MapDocument;
pub use persistence::{SavePipeline, SaveStatus};
pub use store::{MapRecord, MapStore, MapStoreError, MapSummary, MetaPatch};
