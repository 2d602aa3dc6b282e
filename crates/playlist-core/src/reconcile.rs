//! Clean-slate reconciliation of an existing playlist.
//!
//! Associations are detached kind by kind before the playlist itself is
//! deleted, since the backend may refuse to delete a playlist that still has
//! live attachments. Every sub-step is best-effort.

use crate::locator;
use crate::pipeline::StepOutcome;
use crate::routes;
use crate::transport::{Session, Transport};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// A many-to-many association owned by a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    File,
    Screen,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 2] = [AttachmentKind::File, AttachmentKind::Screen];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::File => "file",
            AttachmentKind::Screen => "screen",
        }
    }

    /// Listing of this kind's associations; filtered by `playlistId`.
    pub fn list_path(&self) -> &'static str {
        match self {
            AttachmentKind::File => routes::PLAYLIST_FILES,
            AttachmentKind::Screen => routes::PLAYLIST_SCREENS,
        }
    }

    pub fn delete_batch_path(&self) -> String {
        format!("{}/delete-batch", self.list_path())
    }

    /// Set-replacement endpoint for one playlist.
    pub fn replace_batch_path(&self, playlist_id: Uuid) -> String {
        format!("{}/create-or-update-batch/{playlist_id}", self.list_path())
    }

    /// Key of the id list in a set-replacement body.
    pub fn replace_key(&self) -> &'static str {
        match self {
            AttachmentKind::File => "fileIds",
            AttachmentKind::Screen => "screenIds",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetachOutcome {
    /// The playlist had no associations of this kind.
    Nothing,
    Detached(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub playlist_id: Uuid,
    pub detached: Vec<(AttachmentKind, DetachOutcome)>,
    pub deleted: StepOutcome,
}

/// Detach every association of `playlist_id`, then delete it.
pub fn reconcile<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    playlist_id: Uuid,
) -> ReconcileReport {
    let detached = AttachmentKind::ALL
        .iter()
        .map(|kind| (*kind, detach(session, playlist_id, *kind)))
        .collect();

    let deleted = match session.delete(&routes::playlist(playlist_id), None) {
        Ok(()) => {
            info!(%playlist_id, "existing playlist deleted");
            StepOutcome::Succeeded
        }
        Err(e) => {
            warn!(%playlist_id, error = %e, "deleting existing playlist failed");
            StepOutcome::from_error(&e)
        }
    };

    ReconcileReport {
        playlist_id,
        detached,
        deleted,
    }
}

fn detach<T: Transport + ?Sized>(
    session: &Session<'_, T>,
    playlist_id: Uuid,
    kind: AttachmentKind,
) -> DetachOutcome {
    let query = [("playlistId", playlist_id.to_string())];
    let items = match locator::list_items(session, kind.list_path(), &query) {
        Ok(items) => items,
        Err(e) => {
            warn!(kind = kind.as_str(), error = %e, "listing attachments failed");
            return DetachOutcome::Failed(e.to_string());
        }
    };

    let ids: Vec<Uuid> = items.iter().filter_map(|item| item.id()).collect();
    if ids.is_empty() {
        return DetachOutcome::Nothing;
    }

    match session.delete(&kind.delete_batch_path(), Some(&json!({ "ids": ids }))) {
        Ok(()) => {
            info!(kind = kind.as_str(), count = ids.len(), "attachments detached");
            DetachOutcome::Detached(ids.len())
        }
        Err(e) => {
            warn!(kind = kind.as_str(), error = %e, "detaching attachments failed");
            DetachOutcome::Failed(e.body().map_or_else(|| e.to_string(), str::to_string))
        }
    }
}
