/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use rstest::rstest;

use mindcanvas::layout::{self, LayoutDirection, NODE_HEIGHT, NODE_WIDTH};
use mindcanvas::{HandleSide, SessionIntent};

use super::harness::TestHarness;

fn tree_harness() -> TestHarness {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();
    harness.click_node("1");
    harness.press_tab();
    harness.click_node("2");
    harness.press_tab();
    harness
}

#[rstest]
#[case::left_right(LayoutDirection::LeftRight)]
#[case::top_bottom(LayoutDirection::TopBottom)]
fn test_layout_is_deterministic_for_identical_input(#[case] direction: LayoutDirection) {
    let harness = tree_harness();
    let first = layout::layout(&harness.session.graph, direction);
    let second = layout::layout(&harness.session.graph, direction);
    assert_eq!(first.placements, second.placements);
    assert_eq!(first.bounds, second.bounds);
}

#[rstest]
#[case::left_right(LayoutDirection::LeftRight)]
#[case::top_bottom(LayoutDirection::TopBottom)]
fn test_layout_yields_finite_non_overlapping_positions(#[case] direction: LayoutDirection) {
    let harness = tree_harness();
    let result = layout::layout(&harness.session.graph, direction);

    assert_eq!(result.placements.len(), harness.session.graph.node_count());
    let mut seen = std::collections::HashSet::new();
    for (_, placement) in &result.placements {
        assert!(placement.position.x.is_finite());
        assert!(placement.position.y.is_finite());
        let quantized = (
            placement.position.x.round() as i64,
            placement.position.y.round() as i64,
        );
        assert!(seen.insert(quantized), "nodes must not overlap");
    }
}

#[test]
fn test_layout_survives_user_created_cycle() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();
    // Close the cycle 1 -> 2 -> 1 plus a self-loop.
    harness.connect("2", "1");
    harness.connect("2", "2");

    let result = layout::layout(&harness.session.graph, LayoutDirection::LeftRight);
    assert_eq!(result.placements.len(), 2);
    for (_, placement) in &result.placements {
        assert!(placement.position.x.is_finite());
        assert!(placement.position.y.is_finite());
    }
}

#[test]
fn test_layout_spaces_ranks_by_node_box() {
    let harness = tree_harness();
    let result = layout::layout(&harness.session.graph, LayoutDirection::LeftRight);
    let by_id: std::collections::HashMap<_, _> = result.placements.iter().cloned().collect();

    // Root on rank 0, its children on rank 1, grandchild on rank 2.
    assert!(by_id["2"].position.x - by_id["1"].position.x >= NODE_WIDTH);
    assert!(by_id["4"].position.x - by_id["2"].position.x >= NODE_WIDTH);
    // Siblings share a rank, separated vertically by at least a node box.
    assert_eq!(by_id["2"].position.x, by_id["3"].position.x);
    assert!((by_id["2"].position.y - by_id["3"].position.y).abs() >= NODE_HEIGHT);
}

#[test]
fn test_auto_layout_intent_applies_sides_and_records_history() {
    let mut harness = tree_harness();
    let history_before = harness.session.history_len();

    harness.session.apply_intent(SessionIntent::ApplyAutoLayout {
        direction: LayoutDirection::TopBottom,
    });

    assert_eq!(harness.session.history_len(), history_before + 1);
    for (_, node) in harness.session.graph.nodes() {
        assert_eq!(node.source_side, HandleSide::Bottom);
        assert_eq!(node.target_side, HandleSide::Top);
    }

    // Undo restores the pre-layout positions.
    let positions_after_layout: Vec<_> = harness
        .session
        .graph
        .nodes()
        .map(|(_, node)| (node.id.clone(), node.position))
        .collect();
    harness.press_undo();
    let positions_after_undo: Vec<_> = harness
        .session
        .graph
        .nodes()
        .map(|(_, node)| (node.id.clone(), node.position))
        .collect();
    assert_ne!(positions_after_layout, positions_after_undo);
}

#[test]
fn test_disconnected_islands_all_receive_positions() {
    let mut harness = TestHarness::open_blank();
    harness.click_node("1");
    harness.press_tab();
    harness.click_node("2");
    harness.press_tab();
    // Orphan the grandchild by deleting its parent.
    harness.click_node("2");
    harness.press_delete();

    let result = layout::layout(&harness.session.graph, LayoutDirection::LeftRight);
    assert_eq!(result.placements.len(), harness.session.graph.node_count());
    let mut seen = std::collections::HashSet::new();
    for (_, placement) in &result.placements {
        let quantized = (
            placement.position.x.round() as i64,
            placement.position.y.round() as i64,
        );
        assert!(seen.insert(quantized));
    }
}
