/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Input handling for the mind-map canvas.
//!
//! Translates host-agnostic keyboard input (`keyboard-types`), pointer
//! gestures, and node edit-widget events into `SessionIntent`s. Detection is
//! separated from application so translation stays pure and testable; the
//! host applies the returned intents to the session.

use euclid::default::Point2D;
use keyboard_types::{Key, Modifiers, NamedKey};

use crate::app::SessionIntent;
use crate::graph::NodeKey;

/// Input-time context the translation needs from the host/session.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    /// True while a text field owns the keyboard (inline label editing, the
    /// title field). All canvas shortcuts are suppressed in this state.
    pub text_field_focused: bool,
}

/// Pointer gestures already resolved against hit-testing by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerGesture {
    ClickNode { key: NodeKey },
    ClickCanvas,
    DoubleClickNode { key: NodeKey },
    /// Drag from a node's connection handle released over another node.
    ConnectionDropOnNode { source: NodeKey, target: NodeKey },
    /// Drag from a node's connection handle released over empty canvas.
    ConnectionDropOnCanvas {
        source: NodeKey,
        screen_position: Point2D<f32>,
    },
    /// Node body dragged to a new position (continuous).
    DragNode {
        key: NodeKey,
        position: Point2D<f32>,
    },
    /// Node body drag released.
    DragRelease,
}

/// Events from a node's inline label edit widget.
///
/// An explicit command channel instead of per-node callbacks: the widget
/// reports what happened, the reducer decides whether anything changes.
#[derive(Debug, Clone, PartialEq)]
pub enum EditBoxEvent {
    /// Enter (without shift) pressed with the current value.
    Commit { node_id: String, value: String },
    /// Focus left the widget with the current value. Commits only when the
    /// value actually changed.
    Blur { node_id: String, value: String },
    /// Escape pressed; discard the draft.
    Cancel,
}

fn primary_modifier(modifiers: Modifiers) -> bool {
    modifiers.contains(Modifiers::CONTROL) || modifiers.contains(Modifiers::META)
}

/// Translate a key press into session intents.
pub fn intents_for_key(key: &Key, modifiers: Modifiers, context: InputContext) -> Vec<SessionIntent> {
    // A focused text field owns the keyboard entirely; commit/cancel arrive
    // through `EditBoxEvent` instead.
    if context.text_field_focused {
        return Vec::new();
    }

    let mut intents = Vec::new();
    match key {
        Key::Named(NamedKey::Tab) if !primary_modifier(modifiers) => {
            intents.push(SessionIntent::AddChildToSelection);
        }
        Key::Named(NamedKey::Backspace | NamedKey::Delete) if !primary_modifier(modifiers) => {
            intents.push(SessionIntent::DeleteSelection);
        }
        Key::Character(character) if primary_modifier(modifiers) => {
            if character.eq_ignore_ascii_case("z") {
                if modifiers.contains(Modifiers::SHIFT) {
                    intents.push(SessionIntent::Redo);
                } else {
                    intents.push(SessionIntent::Undo);
                }
            } else if character.eq_ignore_ascii_case("y") {
                intents.push(SessionIntent::Redo);
            }
        }
        _ => {}
    }
    intents
}

/// Translate a resolved pointer gesture into session intents.
pub fn intents_for_gesture(gesture: PointerGesture) -> Vec<SessionIntent> {
    match gesture {
        PointerGesture::ClickNode { key } => vec![SessionIntent::SelectNode { key }],
        PointerGesture::ClickCanvas => vec![SessionIntent::ClearSelection],
        PointerGesture::DoubleClickNode { key } => vec![
            SessionIntent::SelectNode { key },
            SessionIntent::BeginLabelEdit { key },
        ],
        PointerGesture::ConnectionDropOnNode { source, target } => {
            vec![SessionIntent::ConnectNodes { source, target }]
        }
        PointerGesture::ConnectionDropOnCanvas {
            source,
            screen_position,
        } => vec![SessionIntent::ConnectionDropOnCanvas {
            source,
            screen_position,
        }],
        PointerGesture::DragNode { key, position } => {
            vec![SessionIntent::SetNodePosition { key, position }]
        }
        PointerGesture::DragRelease => vec![SessionIntent::FinishNodeDrag],
    }
}

/// Translate a node edit-widget event into session intents.
pub fn intents_for_edit_event(event: EditBoxEvent) -> Vec<SessionIntent> {
    match event {
        // Blur with an unchanged value no-ops inside the reducer, so both
        // paths funnel into the same commit intent.
        EditBoxEvent::Commit { node_id, value } | EditBoxEvent::Blur { node_id, value } => {
            vec![SessionIntent::CommitLabelEdit {
                node_id,
                label: value,
            }]
        }
        EditBoxEvent::Cancel => vec![SessionIntent::CancelLabelEdit],
    }
}
