/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory map store for tests and demos.
//!
//! Carries small observation hooks (save counters, injected failures) so
//! scenario tests can assert on pipeline behavior without a real backend.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::persistence::types::MapDocument;
use crate::store::{
    MapRecord, MapStore, MapStoreError, MapStoreResult, MapSummary, MetaPatch, unix_now_secs,
};

#[derive(Debug, Clone)]
struct StoredMap {
    title: String,
    is_starred: bool,
    created_at: u64,
    updated_at: u64,
    content: Option<MapDocument>,
    preview_png: Option<Vec<u8>>,
}

/// In-memory `MapStore`.
#[derive(Default)]
pub struct MemoryMapStore {
    maps: Mutex<HashMap<Uuid, StoredMap>>,
    content_saves: AtomicUsize,
    meta_saves: AtomicUsize,
    fail_next_content_save: AtomicBool,
}

impl MemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `update_map_content` calls that reached the store,
    /// including injected failures.
    pub fn content_save_count(&self) -> usize {
        self.content_saves.load(Ordering::SeqCst)
    }

    /// Number of `update_map_meta` calls that reached the store.
    pub fn meta_save_count(&self) -> usize {
        self.meta_saves.load(Ordering::SeqCst)
    }

    /// Make the next content save fail with a backend error.
    pub fn fail_next_content_save(&self) {
        self.fail_next_content_save.store(true, Ordering::SeqCst);
    }

    /// Last successfully saved content document for a map.
    pub fn saved_content(&self, id: Uuid) -> Option<MapDocument> {
        self.maps.lock().get(&id).and_then(|map| map.content.clone())
    }

    /// Last successfully saved preview image for a map.
    pub fn saved_preview(&self, id: Uuid) -> Option<Vec<u8>> {
        self.maps.lock().get(&id).and_then(|map| map.preview_png.clone())
    }

    /// Current title for a map.
    pub fn title_of(&self, id: Uuid) -> Option<String> {
        self.maps.lock().get(&id).map(|map| map.title.clone())
    }
}

impl MapStore for MemoryMapStore {
    fn list_maps(&self) -> BoxFuture<'_, MapStoreResult<Vec<MapSummary>>> {
        let mut summaries: Vec<MapSummary> = self
            .maps
            .lock()
            .iter()
            .map(|(&id, map)| MapSummary {
                id,
                title: map.title.clone(),
                is_starred: map.is_starred,
                created_at: map.created_at,
                updated_at: map.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Box::pin(async move { Ok(summaries) })
    }

    fn create_map(&self, title: String) -> BoxFuture<'_, MapStoreResult<MapSummary>> {
        let id = Uuid::new_v4();
        let now = unix_now_secs();
        let summary = MapSummary {
            id,
            title: title.clone(),
            is_starred: false,
            created_at: now,
            updated_at: now,
        };
        self.maps.lock().insert(
            id,
            StoredMap {
                title,
                is_starred: false,
                created_at: now,
                updated_at: now,
                content: None,
                preview_png: None,
            },
        );
        Box::pin(async move { Ok(summary) })
    }

    fn get_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<MapRecord>> {
        let result = self
            .maps
            .lock()
            .get(&id)
            .map(|map| MapRecord {
                id,
                title: map.title.clone(),
                is_starred: map.is_starred,
                content: map.content.clone(),
            })
            .ok_or(MapStoreError::NotFound);
        Box::pin(async move { result })
    }

    fn update_map_meta(&self, id: Uuid, patch: MetaPatch) -> BoxFuture<'_, MapStoreResult<()>> {
        self.meta_saves.fetch_add(1, Ordering::SeqCst);
        let result = {
            let mut maps = self.maps.lock();
            match maps.get_mut(&id) {
                Some(map) => {
                    if let Some(title) = patch.title {
                        map.title = title;
                    }
                    if let Some(is_starred) = patch.is_starred {
                        map.is_starred = is_starred;
                    }
                    map.updated_at = unix_now_secs();
                    Ok(())
                }
                None => Err(MapStoreError::NotFound),
            }
        };
        Box::pin(async move { result })
    }

    fn update_map_content(
        &self,
        id: Uuid,
        content: MapDocument,
        preview_png: Option<Vec<u8>>,
    ) -> BoxFuture<'_, MapStoreResult<()>> {
        self.content_saves.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_next_content_save.swap(false, Ordering::SeqCst) {
            Err(MapStoreError::Backend("injected save failure".to_string()))
        } else {
            let mut maps = self.maps.lock();
            match maps.get_mut(&id) {
                Some(map) => {
                    map.content = Some(content);
                    if preview_png.is_some() {
                        map.preview_png = preview_png;
                    }
                    map.updated_at = unix_now_secs();
                    Ok(())
                }
                None => Err(MapStoreError::NotFound),
            }
        };
        Box::pin(async move { result })
    }

    fn delete_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<()>> {
        let result = match self.maps.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(MapStoreError::NotFound),
        };
        Box::pin(async move { result })
    }
}
