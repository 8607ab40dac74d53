/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;
use std::time::Duration;

use mindcanvas::persistence::{SAVE_DEBOUNCE, SavePipeline, SaveStatus};
use mindcanvas::store::{MapStore, MemoryMapStore};
use mindcanvas::{MapSession, SessionIntent, Viewport};

use super::harness::TestHarness;

async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(SAVE_DEBOUNCE + Duration::from_millis(50)).await;
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

async fn open_session(store: &Arc<MemoryMapStore>) -> MapSession {
    let summary = store.create_map("Untitled".to_string()).await.unwrap();
    let record = store.get_map(summary.id).await.unwrap();
    let mut session = MapSession::open(record);
    session.attach_pipeline(SavePipeline::spawn(
        summary.id,
        store.clone() as Arc<dyn MapStore>,
        false,
    ));
    session
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_saves_once_with_final_state() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();

    // Three rapid edits inside one debounce window.
    let root = session.graph.node_key("1").unwrap();
    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    session.apply_intent(SessionIntent::AddChildToSelection);
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;

    assert_eq!(store.content_save_count(), 1, "edits coalesce into one save");
    let saved = store.saved_content(map_id).expect("content saved");
    assert_eq!(saved.nodes.len(), 4, "save carries the state after the last edit");
    assert_eq!(session.save_status(), SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_viewport_only_changes_do_not_trigger_saves() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;

    session.apply_intent(SessionIntent::SetViewport {
        viewport: Viewport {
            x: 250.0,
            y: -40.0,
            zoom: 1.5,
        },
    });
    settle().await;

    assert_eq!(store.content_save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_saved_viewport_reflects_pan_at_save_time() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();

    let root = session.graph.node_key("1").unwrap();
    session.apply_intent(SessionIntent::SelectNode { key: root });
    // Pan first, then edit: the save carries the panned viewport even though
    // the pan itself never triggers one.
    session.apply_intent(SessionIntent::SetViewport {
        viewport: Viewport {
            x: 33.0,
            y: 44.0,
            zoom: 2.0,
        },
    });
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;

    let saved = store.saved_content(map_id).unwrap();
    assert_eq!(saved.viewport.x, 33.0);
    assert_eq!(saved.viewport.y, 44.0);
    assert_eq!(saved.viewport.zoom, 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_rename_persists_immediately_without_content_save() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();

    session.apply_intent(SessionIntent::RenameMap {
        title: "Quarterly Goals".to_string(),
    });
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }

    assert_eq!(store.title_of(map_id).as_deref(), Some("Quarterly Goals"));
    assert_eq!(store.content_save_count(), 0, "title bypasses the debounce");
    assert_eq!(session.title(), "Quarterly Goals");
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_retries_on_next_edit_cycle() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();
    let root = session.graph.node_key("1").unwrap();

    store.fail_next_content_save();
    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;
    assert!(store.saved_content(map_id).is_none(), "first save failed");
    assert_eq!(session.save_status(), SaveStatus::Idle, "failure resolves status");

    // The user keeps editing; the next cycle carries the latest state.
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;
    let saved = store.saved_content(map_id).expect("retry succeeded");
    assert_eq!(saved.nodes.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_close_flushes_pending_edits() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();

    let root = session.graph.node_key("1").unwrap();
    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    // Navigate away before the debounce window elapses.
    session.close();
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }

    let saved = store.saved_content(map_id).expect("close flushed the edit");
    assert_eq!(saved.nodes.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_undo_is_persisted_like_any_content_change() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();
    let root = session.graph.node_key("1").unwrap();

    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;
    assert_eq!(store.saved_content(map_id).unwrap().nodes.len(), 2);

    session.apply_intent(SessionIntent::Undo);
    settle().await;
    assert_eq!(
        store.saved_content(map_id).unwrap().nodes.len(),
        1,
        "restored state reaches the store"
    );
}

#[tokio::test(start_paused = true)]
async fn test_preview_png_saved_alongside_content() {
    let store = Arc::new(MemoryMapStore::new());
    let summary = store.create_map("thumbs".to_string()).await.unwrap();
    let record = store.get_map(summary.id).await.unwrap();
    let mut session = MapSession::open(record);
    session.attach_pipeline(SavePipeline::spawn(
        summary.id,
        store.clone() as Arc<dyn MapStore>,
        true,
    ));

    let root = session.graph.node_key("1").unwrap();
    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;

    let preview = store.saved_preview(summary.id).expect("preview stored");
    assert_eq!(&preview[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test(start_paused = true)]
async fn test_saved_document_roundtrips_into_new_session() {
    let store = Arc::new(MemoryMapStore::new());
    let mut session = open_session(&store).await;
    let map_id = session.map_id();
    let root = session.graph.node_key("1").unwrap();

    session.apply_intent(SessionIntent::SelectNode { key: root });
    session.apply_intent(SessionIntent::AddChildToSelection);
    settle().await;
    session.close();
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }

    // Reopen from the store, as navigating back to the map would.
    let record = store.get_map(map_id).await.unwrap();
    let mut harness = TestHarness::open_with_content(record.content.unwrap());
    assert_eq!(harness.node_ids(), vec!["1", "2"]);
    assert_eq!(harness.session.history_len(), 1, "history is not persisted");

    // The id allocator resumes past the loaded ids.
    harness.click_node("2");
    harness.press_tab();
    assert_eq!(harness.node_ids(), vec!["1", "2", "3"]);
}
