/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Local embedded map store backed by redb.
//!
//! Layout: one redb database holding three tables keyed by map id —
//! metadata records (JSON), content documents (JSON, overwritten wholesale on
//! each save), and preview PNGs. No journal: the document is the atomic unit
//! of save.

use futures_util::future::BoxFuture;
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::persistence::types::MapDocument;
use crate::store::{
    MapRecord, MapStore, MapStoreError, MapStoreResult, MapSummary, MetaPatch, unix_now_secs,
};

const META_TABLE: redb::TableDefinition<&str, &[u8]> = redb::TableDefinition::new("map_meta");
const CONTENT_TABLE: redb::TableDefinition<&str, &[u8]> =
    redb::TableDefinition::new("map_contents");
const PREVIEW_TABLE: redb::TableDefinition<&str, &[u8]> =
    redb::TableDefinition::new("map_previews");

/// Metadata record as stored in `META_TABLE`.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct StoredMeta {
    title: String,
    is_starred: bool,
    created_at: u64,
    updated_at: u64,
}

/// Embedded `MapStore` over a single redb database file.
pub struct RedbMapStore {
    db: redb::Database,
}

impl RedbMapStore {
    /// Open or create a map store under the given directory.
    pub fn open(base_dir: PathBuf) -> Result<Self, MapStoreError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| MapStoreError::Io(format!("Failed to create dir: {e}")))?;
        let db = redb::Database::create(base_dir.join("maps.redb"))
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        Ok(Self { db })
    }

    /// Get the default storage directory for map data
    pub fn default_data_dir() -> PathBuf {
        let mut dir = dirs::config_dir().expect("No config directory available");
        dir.push("mindcanvas");
        dir.push("maps");
        dir
    }

    fn read_meta(&self, id: Uuid) -> MapStoreResult<StoredMeta> {
        let key = id.to_string();
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        let Ok(table) = read_txn.open_table(META_TABLE) else {
            return Err(MapStoreError::NotFound);
        };
        let entry = table
            .get(key.as_str())
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?
            .ok_or(MapStoreError::NotFound)?;
        serde_json::from_slice(entry.value())
            .map_err(|e| MapStoreError::Serialization(format!("{e}")))
    }

    fn write_meta(&self, id: Uuid, meta: &StoredMeta) -> MapStoreResult<()> {
        let key = id.to_string();
        let bytes =
            serde_json::to_vec(meta).map_err(|e| MapStoreError::Serialization(format!("{e}")))?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        {
            let mut table = write_txn
                .open_table(META_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        Ok(())
    }

    fn read_content(&self, id: Uuid) -> MapStoreResult<Option<MapDocument>> {
        let key = id.to_string();
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        let Ok(table) = read_txn.open_table(CONTENT_TABLE) else {
            return Ok(None);
        };
        let Some(entry) = table
            .get(key.as_str())
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?
        else {
            return Ok(None);
        };
        let document = serde_json::from_slice(entry.value())
            .map_err(|e| MapStoreError::Serialization(format!("{e}")))?;
        Ok(Some(document))
    }

    fn write_content(
        &self,
        id: Uuid,
        content: &MapDocument,
        preview_png: Option<&[u8]>,
    ) -> MapStoreResult<()> {
        let key = id.to_string();
        let bytes = serde_json::to_vec(content)
            .map_err(|e| MapStoreError::Serialization(format!("{e}")))?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        {
            let mut table = write_txn
                .open_table(CONTENT_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        }
        if let Some(preview) = preview_png {
            let mut table = write_txn
                .open_table(PREVIEW_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            table
                .insert(key.as_str(), preview)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        Ok(())
    }

    fn remove_map(&self, id: Uuid) -> MapStoreResult<()> {
        let key = id.to_string();
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        let removed = {
            let mut table = write_txn
                .open_table(META_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            table
                .remove(key.as_str())
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?
                .is_some()
        };
        {
            let mut table = write_txn
                .open_table(CONTENT_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            let _ = table
                .remove(key.as_str())
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        }
        {
            let mut table = write_txn
                .open_table(PREVIEW_TABLE)
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            let _ = table
                .remove(key.as_str())
                .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        if removed { Ok(()) } else { Err(MapStoreError::NotFound) }
    }

    fn list_summaries(&self) -> MapStoreResult<Vec<MapSummary>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        let Ok(table) = read_txn.open_table(META_TABLE) else {
            return Ok(Vec::new());
        };
        let iter = table
            .iter()
            .map_err(|e| MapStoreError::Backend(format!("{e}")))?;
        let mut summaries = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(|e| MapStoreError::Backend(format!("{e}")))?;
            let Ok(id) = Uuid::parse_str(key.value()) else {
                continue;
            };
            let Ok(meta) = serde_json::from_slice::<StoredMeta>(value.value()) else {
                continue;
            };
            summaries.push(MapSummary {
                id,
                title: meta.title,
                is_starred: meta.is_starred,
                created_at: meta.created_at,
                updated_at: meta.updated_at,
            });
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }
}

impl MapStore for RedbMapStore {
    fn list_maps(&self) -> BoxFuture<'_, MapStoreResult<Vec<MapSummary>>> {
        let result = self.list_summaries();
        Box::pin(async move { result })
    }

    fn create_map(&self, title: String) -> BoxFuture<'_, MapStoreResult<MapSummary>> {
        let id = Uuid::new_v4();
        let now = unix_now_secs();
        let meta = StoredMeta {
            title,
            is_starred: false,
            created_at: now,
            updated_at: now,
        };
        let result = self.write_meta(id, &meta).map(|()| MapSummary {
            id,
            title: meta.title.clone(),
            is_starred: meta.is_starred,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        });
        Box::pin(async move { result })
    }

    fn get_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<MapRecord>> {
        let result = self.read_meta(id).and_then(|meta| {
            let content = self.read_content(id)?;
            Ok(MapRecord {
                id,
                title: meta.title,
                is_starred: meta.is_starred,
                content,
            })
        });
        Box::pin(async move { result })
    }

    fn update_map_meta(&self, id: Uuid, patch: MetaPatch) -> BoxFuture<'_, MapStoreResult<()>> {
        let result = self.read_meta(id).and_then(|mut meta| {
            if let Some(title) = patch.title {
                meta.title = title;
            }
            if let Some(is_starred) = patch.is_starred {
                meta.is_starred = is_starred;
            }
            meta.updated_at = unix_now_secs();
            self.write_meta(id, &meta)
        });
        Box::pin(async move { result })
    }

    fn update_map_content(
        &self,
        id: Uuid,
        content: MapDocument,
        preview_png: Option<Vec<u8>>,
    ) -> BoxFuture<'_, MapStoreResult<()>> {
        let result = self.read_meta(id).and_then(|mut meta| {
            self.write_content(id, &content, preview_png.as_deref())?;
            meta.updated_at = unix_now_secs();
            self.write_meta(id, &meta)
        });
        Box::pin(async move { result })
    }

    fn delete_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<()>> {
        let result = self.remove_map(id);
        Box::pin(async move { result })
    }
}
