/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use keyboard_types::{Key, Modifiers, NamedKey};
use uuid::Uuid;

use mindcanvas::input::{self, InputContext, PointerGesture};
use mindcanvas::persistence::types::MapDocument;
use mindcanvas::store::MapRecord;
use mindcanvas::{MapSession, NodeKey};

/// Drives a `MapSession` the way a host would: gestures and key presses go
/// through the input translation layer, never straight at the reducer.
pub(crate) struct TestHarness {
    pub(crate) session: MapSession,
}

#[allow(dead_code)]
impl TestHarness {
    /// Session over a map with no stored content (default root node "1").
    pub(crate) fn open_blank() -> Self {
        Self {
            session: MapSession::open(MapRecord {
                id: Uuid::new_v4(),
                title: "Untitled".to_string(),
                is_starred: false,
                content: None,
            }),
        }
    }

    /// Session over explicit stored content.
    pub(crate) fn open_with_content(content: MapDocument) -> Self {
        Self {
            session: MapSession::open(MapRecord {
                id: Uuid::new_v4(),
                title: "Untitled".to_string(),
                is_starred: false,
                content: Some(content),
            }),
        }
    }

    fn context(&self) -> InputContext {
        InputContext {
            text_field_focused: self.session.text_field_focused(),
        }
    }

    pub(crate) fn key_for(&self, id: &str) -> NodeKey {
        self.session.graph.node_key(id).expect("node exists")
    }

    pub(crate) fn click_node(&mut self, id: &str) {
        let key = self.key_for(id);
        self.session
            .apply_intents(input::intents_for_gesture(PointerGesture::ClickNode {
                key,
            }));
    }

    pub(crate) fn click_canvas(&mut self) {
        self.session
            .apply_intents(input::intents_for_gesture(PointerGesture::ClickCanvas));
    }

    pub(crate) fn double_click_node(&mut self, id: &str) {
        let key = self.key_for(id);
        self.session
            .apply_intents(input::intents_for_gesture(PointerGesture::DoubleClickNode {
                key,
            }));
    }

    pub(crate) fn press(&mut self, key: Key, modifiers: Modifiers) {
        let context = self.context();
        self.session
            .apply_intents(input::intents_for_key(&key, modifiers, context));
    }

    pub(crate) fn press_tab(&mut self) {
        self.press(Key::Named(NamedKey::Tab), Modifiers::empty());
    }

    pub(crate) fn press_delete(&mut self) {
        self.press(Key::Named(NamedKey::Delete), Modifiers::empty());
    }

    pub(crate) fn press_undo(&mut self) {
        self.press(Key::Character("z".to_string()), Modifiers::CONTROL);
    }

    pub(crate) fn press_redo(&mut self) {
        self.press(
            Key::Character("z".to_string()),
            Modifiers::CONTROL | Modifiers::SHIFT,
        );
    }

    pub(crate) fn connect(&mut self, source_id: &str, target_id: &str) {
        let source = self.key_for(source_id);
        let target = self.key_for(target_id);
        self.session
            .apply_intents(input::intents_for_gesture(
                PointerGesture::ConnectionDropOnNode { source, target },
            ));
    }

    pub(crate) fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .session
            .graph
            .nodes()
            .map(|(_, node)| node.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn edge_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .session
            .graph
            .edges()
            .map(|edge| edge.data.id.clone())
            .collect();
        ids.sort();
        ids
    }
}
