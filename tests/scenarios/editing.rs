/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use keyboard_types::{Key, Modifiers};

use mindcanvas::input::{self, EditBoxEvent};
use mindcanvas::{NodeColor, SessionIntent};

use super::harness::TestHarness;

#[test]
fn test_tab_on_selected_root_creates_connected_child() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();

    assert_eq!(harness.node_ids(), vec!["1", "2"]);
    assert_eq!(harness.edge_ids(), vec!["e1-2"]);
    assert_eq!(harness.session.history_len(), 2, "initial + this edit");
}

#[test]
fn test_delete_selected_child_removes_node_and_edge() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();
    harness.click_node("2");
    harness.press_delete();

    assert_eq!(harness.node_ids(), vec!["1"]);
    assert!(harness.edge_ids().is_empty());
    assert_eq!(harness.session.history_len(), 3);
    assert!(harness.session.selection().is_none());
}

#[test]
fn test_self_loop_connect_is_accepted() {
    let mut harness = TestHarness::open_blank();
    harness.connect("1", "1");

    assert_eq!(harness.edge_ids(), vec!["e1-1"]);
    let edge = harness.session.graph.edges().next().unwrap();
    assert_eq!(edge.from, edge.to);
}

#[test]
fn test_duplicate_edges_are_not_deduplicated() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();

    harness.connect("1", "2");
    assert_eq!(
        harness.edge_ids(),
        vec!["e1-2", "e1-2"],
        "parallel edge accepted alongside the parent edge"
    );
}

#[test]
fn test_click_canvas_clears_selection_and_disables_toolbar() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    assert!(harness.session.can_edit_selection());

    harness.click_canvas();
    assert!(harness.session.selection().is_none());
    assert!(!harness.session.can_edit_selection());
}

#[test]
fn test_double_click_then_commit_renames_node() {
    let mut harness = TestHarness::open_blank();
    harness.double_click_node("1");
    assert!(harness.session.text_field_focused());

    harness
        .session
        .apply_intents(input::intents_for_edit_event(EditBoxEvent::Commit {
            node_id: "1".to_string(),
            value: "Project Plan".to_string(),
        }));

    assert_eq!(harness.session.graph.get("1").unwrap().label, "Project Plan");
    assert_eq!(harness.session.history_len(), 2);
    assert!(!harness.session.text_field_focused());
}

#[test]
fn test_blur_without_change_commits_nothing() {
    let mut harness = TestHarness::open_blank();
    harness.double_click_node("1");
    harness
        .session
        .apply_intents(input::intents_for_edit_event(EditBoxEvent::Blur {
            node_id: "1".to_string(),
            value: "Central Idea".to_string(),
        }));

    assert_eq!(harness.session.history_len(), 1);
    assert!(!harness.session.text_field_focused());
}

#[test]
fn test_escape_discards_label_draft() {
    let mut harness = TestHarness::open_blank();
    harness.double_click_node("1");
    harness
        .session
        .apply_intents(input::intents_for_edit_event(EditBoxEvent::Cancel));

    assert_eq!(harness.session.graph.get("1").unwrap().label, "Central Idea");
    assert_eq!(harness.session.history_len(), 1);
}

#[test]
fn test_shortcuts_ignored_while_editing_label() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.double_click_node("1");

    // Tab and Delete go to the text field, not the canvas.
    harness.press_tab();
    harness.press_delete();
    assert_eq!(harness.node_ids(), vec!["1"]);

    // Undo shortcut is ignored too while a text field has focus.
    harness.press(Key::Character("z".to_string()), Modifiers::CONTROL);
    assert_eq!(harness.session.history_cursor(), 0);
}

#[test]
fn test_palette_colors_selected_node() {
    let mut harness = TestHarness::open_blank();
    harness.session.apply_intent(SessionIntent::SetNodeColor {
        color: NodeColor::Purple,
    });
    assert_eq!(
        harness.session.graph.get("1").unwrap().color,
        NodeColor::None,
        "no selection, no recolor"
    );

    harness.click_node("1");
    harness.session.apply_intent(SessionIntent::SetNodeColor {
        color: NodeColor::Purple,
    });
    assert_eq!(
        harness.session.graph.get("1").unwrap().color,
        NodeColor::Purple
    );
}

#[test]
fn test_deleting_every_node_keeps_session_usable() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();
    harness.click_node("2");
    harness.press_delete();
    harness.click_node("1");
    harness.press_delete();

    assert!(harness.session.graph.is_empty());
    assert!(harness.session.content_bounds().is_none());
    // The empty graph still serializes and records.
    let document = harness.session.document();
    assert!(document.nodes.is_empty());
    assert!(document.edges.is_empty());
}
