/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debounced save pipeline between the session and the map store.
//!
//! Architecture:
//! - The session pushes every content change (nodes or edges, never
//!   viewport-only) into an unbounded channel as a full serialized document.
//! - A supervised tokio worker debounces: it keeps absorbing newer documents
//!   until 1000ms of quiescence, then saves the latest one.
//! - Saves are serialized with coalescing (queue of depth 1): edits arriving
//!   during an in-flight save fold into exactly one follow-up save.
//! - Title/star updates bypass the debounce and persist immediately.
//! - Failures are logged and absorbed; the next debounce cycle retries with
//!   the latest state. The user is never blocked.

pub mod types;

use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::preview::render_map_preview;
use crate::store::{MapStore, MetaPatch};
use types::MapDocument;

/// Quiescence window before a content change is written out.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Save pipeline status, surfaced as the "Saving…"/"Saved" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
}

enum PipelineMessage {
    Content(MapDocument),
    Meta(MetaPatch),
    Flush,
}

/// Handle to the save worker for one open map.
///
/// Constructed on map open, torn down on navigate-away. Dropping the handle
/// cancels the worker.
pub struct SavePipeline {
    tx: mpsc::UnboundedSender<PipelineMessage>,
    status_rx: watch::Receiver<SaveStatus>,
    cancel: CancellationToken,
}

impl SavePipeline {
    /// Spawn the save worker for `map_id` onto the current tokio runtime.
    ///
    /// `render_previews` controls whether content saves carry a preview PNG.
    pub fn spawn(map_id: Uuid, store: Arc<dyn MapStore>, render_previews: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            run_worker(map_id, store, render_previews, rx, status_tx, worker_cancel).await;
        });
        Self {
            tx,
            status_rx,
            cancel,
        }
    }

    /// Queue the latest content document for a debounced save.
    pub fn notify_content(&self, document: MapDocument) {
        let _ = self.tx.send(PipelineMessage::Content(document));
    }

    /// Persist a metadata change immediately, bypassing the debounce.
    pub fn update_meta(&self, patch: MetaPatch) {
        let _ = self.tx.send(PipelineMessage::Meta(patch));
    }

    /// Force any pending (not yet quiescent) document to save now.
    pub fn flush(&self) {
        let _ = self.tx.send(PipelineMessage::Flush);
    }

    /// Current worker status.
    pub fn status(&self) -> SaveStatus {
        *self.status_rx.borrow()
    }

    /// Watch receiver for status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status_rx.clone()
    }

    /// Stop the worker. An in-flight save is never cancelled mid-call, but
    /// no further messages are processed.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SavePipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_worker(
    map_id: Uuid,
    store: Arc<dyn MapStore>,
    render_previews: bool,
    mut rx: mpsc::UnboundedReceiver<PipelineMessage>,
    status_tx: watch::Sender<SaveStatus>,
    cancel: CancellationToken,
) {
    let mut pending: Option<MapDocument> = None;
    'outer: loop {
        // Biased: drain queued messages (including a teardown flush) before
        // honoring cancellation.
        let message = tokio::select! {
            biased;
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = cancel.cancelled() => break,
        };

        match message {
            PipelineMessage::Meta(patch) => {
                apply_meta(map_id, store.as_ref(), patch).await;
                continue;
            }
            PipelineMessage::Flush => {
                if let Some(document) = pending.take() {
                    perform_save(map_id, store.as_ref(), render_previews, document, &status_tx)
                        .await;
                }
                continue;
            }
            PipelineMessage::Content(document) => pending = Some(document),
        }

        // Debounce window: every newer document restarts the quiescence
        // timer and supersedes the pending one.
        loop {
            tokio::select! {
                biased;
                message = rx.recv() => match message {
                    Some(PipelineMessage::Content(document)) => pending = Some(document),
                    Some(PipelineMessage::Meta(patch)) => {
                        apply_meta(map_id, store.as_ref(), patch).await;
                    }
                    Some(PipelineMessage::Flush) => break,
                    None => {
                        if let Some(document) = pending.take() {
                            perform_save(
                                map_id,
                                store.as_ref(),
                                render_previews,
                                document,
                                &status_tx,
                            )
                            .await;
                        }
                        break 'outer;
                    }
                },
                _ = cancel.cancelled() => break 'outer,
                _ = tokio::time::sleep(SAVE_DEBOUNCE) => break,
            }
        }

        if let Some(document) = pending.take() {
            perform_save(map_id, store.as_ref(), render_previews, document, &status_tx).await;
        }
    }
}

async fn perform_save(
    map_id: Uuid,
    store: &dyn MapStore,
    render_previews: bool,
    document: MapDocument,
    status_tx: &watch::Sender<SaveStatus>,
) {
    let _ = status_tx.send(SaveStatus::Saving);

    let preview_png = if render_previews {
        match render_map_preview(&document) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Preview render failed for map {map_id}: {e}");
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = store.update_map_content(map_id, document, preview_png).await {
        warn!("Failed to save map {map_id}: {e}");
    }

    let _ = status_tx.send(SaveStatus::Idle);
}

async fn apply_meta(map_id: Uuid, store: &dyn MapStore, patch: MetaPatch) {
    if let Err(e) = store.update_map_meta(map_id, patch).await {
        warn!("Failed to update metadata for map {map_id}: {e}");
    }
}
