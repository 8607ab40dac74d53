/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Map record storage collaborators.
//!
//! The engine treats the record store as an external collaborator behind the
//! `MapStore` trait: simple create/read/update/delete operations keyed by map
//! id, with one content document per map overwritten wholesale on each save
//! (last write wins, no concurrency token). Two implementations ship here:
//! `MemoryMapStore` for tests and demos, `RedbMapStore` for a local embedded
//! database.

pub mod memory;
pub mod redb;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::persistence::types::MapDocument;

pub use self::memory::MemoryMapStore;
pub use self::redb::RedbMapStore;

/// Listing/record metadata for a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub id: Uuid,
    pub title: String,
    pub is_starred: bool,
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds; bumped on every meta or content write.
    pub updated_at: u64,
}

/// A full map record: metadata plus the optional content document.
///
/// `content == None` means the map has never been saved; the session opens it
/// with the default root node. A present-but-empty document stays empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    pub id: Uuid,
    pub title: String,
    pub is_starred: bool,
    pub content: Option<MapDocument>,
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaPatch {
    pub title: Option<String>,
    pub is_starred: Option<bool>,
}

impl MetaPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn starred(is_starred: bool) -> Self {
        Self {
            is_starred: Some(is_starred),
            ..Self::default()
        }
    }
}

/// Errors from map stores
#[derive(Debug)]
pub enum MapStoreError {
    NotFound,
    Io(String),
    Serialization(String),
    Backend(String),
}

impl std::fmt::Display for MapStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapStoreError::NotFound => write!(f, "Map not found"),
            MapStoreError::Io(e) => write!(f, "IO error: {e}"),
            MapStoreError::Serialization(e) => write!(f, "Serialization error: {e}"),
            MapStoreError::Backend(e) => write!(f, "Backend error: {e}"),
        }
    }
}

impl std::error::Error for MapStoreError {}

pub type MapStoreResult<T> = Result<T, MapStoreError>;

/// The record-store collaborator contract.
///
/// Futures are boxed so the trait stays object-safe; the save pipeline holds
/// stores as `Arc<dyn MapStore>`.
pub trait MapStore: Send + Sync {
    /// All maps, most recently updated first.
    fn list_maps(&self) -> BoxFuture<'_, MapStoreResult<Vec<MapSummary>>>;

    /// Create a map with no stored content.
    fn create_map(&self, title: String) -> BoxFuture<'_, MapStoreResult<MapSummary>>;

    fn get_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<MapRecord>>;

    fn update_map_meta(&self, id: Uuid, patch: MetaPatch) -> BoxFuture<'_, MapStoreResult<()>>;

    /// Overwrite the map's content document, optionally with a preview PNG.
    fn update_map_content(
        &self,
        id: Uuid,
        content: MapDocument,
        preview_png: Option<Vec<u8>>,
    ) -> BoxFuture<'_, MapStoreResult<()>>;

    fn delete_map(&self, id: Uuid) -> BoxFuture<'_, MapStoreResult<()>>;
}

/// Current time as unix seconds (0 on a pre-epoch clock).
pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
