//! Slot lifecycle operations: add, replace, delete, and listing for the
//! bounded media collections a profile owns.
//!
//! The service composes the quota check, the lowest-free-index allocator,
//! the conflict-checked slot store, and asset cleanup. Database rows are
//! authoritative; asset files follow them, so cleanup failures are logged
//! and swallowed rather than surfaced.

pub mod allocator;

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;

use crate::asset_store::{AssetStore, AssetStoreError};
use crate::config::MediaQuotas;
use crate::storage::models::{MediaKind, PayloadRef, SlotRecord};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{kind} limit of {capacity} reached")]
    CapacityExceeded { kind: MediaKind, capacity: u32 },
    #[error("no {kind} slot at index {index}")]
    NotFound { kind: MediaKind, index: u32 },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("asset store error: {0}")]
    Asset(#[from] AssetStoreError),
}

/// Content for a new or replacement slot, before it has been recorded.
#[derive(Debug, Clone)]
pub enum NewPayload {
    Upload {
        data: Bytes,
        file_name: Option<String>,
        mime_type: String,
    },
    Link {
        url: String,
    },
}

/// A staged payload: asset bytes already written (for uploads), row not yet
/// recorded.
struct Staged {
    payload: PayloadRef,
    mime_type: Option<String>,
    byte_size: Option<u64>,
}

pub struct MediaService {
    db: Database,
    assets: Arc<dyn AssetStore>,
    quotas: MediaQuotas,
}

impl MediaService {
    pub fn new(db: Database, assets: Arc<dyn AssetStore>, quotas: MediaQuotas) -> Self {
        Self { db, assets, quotas }
    }

    pub fn capacity(&self, kind: MediaKind) -> u32 {
        self.quotas.capacity(kind)
    }

    /// Add a payload to the user's collection at the lowest free index.
    ///
    /// The index computed from a snapshot of the occupied set is only a
    /// candidate; the insert re-checks it under the store's write lock. A
    /// concurrent add that claims the candidate first costs exactly one
    /// retry, after which the group is reported full.
    pub async fn add(
        &self,
        user_id: &str,
        kind: MediaKind,
        payload: NewPayload,
    ) -> Result<SlotRecord, MediaError> {
        validate_payload(kind, &payload)?;
        let capacity = self.quotas.capacity(kind);
        let group = self.db.get_or_create_group(user_id, kind)?;

        // Quota probe before any asset bytes are written. Read-only; the
        // insert below is what actually settles races.
        let occupied = self.db.occupied_indices(&group.id)?;
        if !allocator::has_capacity(&occupied, capacity) {
            return Err(MediaError::CapacityExceeded { kind, capacity });
        }

        let staged = self.stage(&payload).await?;

        for attempt in 0..2 {
            let occupied = self.db.occupied_indices(&group.id)?;
            let Some(index) = allocator::next_free_index(&occupied, capacity) else {
                break;
            };

            let now = Utc::now();
            let record = SlotRecord {
                group_id: group.id.clone(),
                index,
                payload: staged.payload.clone(),
                mime_type: staged.mime_type.clone(),
                byte_size: staged.byte_size,
                created_at: now,
                updated_at: now,
            };

            if self.db.insert_slot(&record)? {
                tracing::debug!(user_id, kind = %kind, index, "added media slot");
                return Ok(record);
            }

            tracing::debug!(
                group_id = %group.id,
                index,
                attempt,
                "slot index claimed concurrently"
            );
        }

        self.discard(&staged.payload).await;
        Err(MediaError::CapacityExceeded { kind, capacity })
    }

    /// Replace the payload at an occupied index, keeping the index. The new
    /// payload is durably recorded before the old backing asset is removed,
    /// so the slot never points at a deleted file.
    pub async fn replace(
        &self,
        user_id: &str,
        kind: MediaKind,
        index: u32,
        payload: NewPayload,
    ) -> Result<SlotRecord, MediaError> {
        validate_payload(kind, &payload)?;
        let not_found = || MediaError::NotFound { kind, index };

        let group = self.db.get_group(user_id, kind)?.ok_or_else(not_found)?;
        let existing = self.db.get_slot(&group.id, index)?.ok_or_else(not_found)?;

        let staged = self.stage(&payload).await?;
        let record = SlotRecord {
            group_id: group.id.clone(),
            index,
            payload: staged.payload.clone(),
            mime_type: staged.mime_type.clone(),
            byte_size: staged.byte_size,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        if !self.db.update_slot(&record)? {
            // Deleted out from under us between lookup and write.
            self.discard(&staged.payload).await;
            return Err(not_found());
        }

        self.discard(&existing.payload).await;
        tracing::debug!(user_id, kind = %kind, index, "replaced media slot");
        Ok(record)
    }

    /// Delete the slot at an index, freeing it for reuse, and remove its
    /// backing asset best-effort.
    pub async fn delete(
        &self,
        user_id: &str,
        kind: MediaKind,
        index: u32,
    ) -> Result<(), MediaError> {
        let not_found = || MediaError::NotFound { kind, index };

        let group = self.db.get_group(user_id, kind)?.ok_or_else(not_found)?;
        let removed = self.db.delete_slot(&group.id, index)?.ok_or_else(not_found)?;

        self.discard(&removed.payload).await;
        tracing::debug!(user_id, kind = %kind, index, "deleted media slot");
        Ok(())
    }

    /// Drain every slot of the user's collection for one kind. Returns the
    /// number of slots removed; asset cleanup is best-effort per file.
    pub async fn delete_all(&self, user_id: &str, kind: MediaKind) -> Result<u64, MediaError> {
        let Some(group) = self.db.get_group(user_id, kind)? else {
            return Ok(0);
        };

        let removed = self.db.delete_group_slots(&group.id)?;
        for slot in &removed {
            self.discard(&slot.payload).await;
        }

        tracing::debug!(user_id, kind = %kind, count = removed.len(), "cleared media group");
        Ok(removed.len() as u64)
    }

    /// Cascade delete across every kind the user has, groups included. This
    /// is the account-deletion path.
    pub async fn purge_user(&self, user_id: &str) -> Result<u64, MediaError> {
        let mut removed = 0;
        for kind in MediaKind::ALL {
            removed += self.delete_all(user_id, kind).await?;
            self.db.delete_group(user_id, kind)?;
        }
        tracing::info!(user_id, slots = removed, "purged all media for user");
        Ok(removed)
    }

    /// Surviving slots ordered by index. Listing never creates the group.
    pub async fn list(&self, user_id: &str, kind: MediaKind) -> Result<Vec<SlotRecord>, MediaError> {
        match self.db.get_group(user_id, kind)? {
            Some(group) => Ok(self.db.list_slots(&group.id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Write upload bytes to the asset store under a fresh key; links pass
    /// through untouched.
    async fn stage(&self, payload: &NewPayload) -> Result<Staged, MediaError> {
        match payload {
            NewPayload::Upload {
                data,
                file_name,
                mime_type,
            } => {
                let key = asset_key(file_name.as_deref());
                let byte_size = data.len() as u64;
                self.assets.put(&key, data.clone()).await?;
                Ok(Staged {
                    payload: PayloadRef::Upload(key),
                    mime_type: Some(mime_type.clone()),
                    byte_size: Some(byte_size),
                })
            }
            NewPayload::Link { url } => Ok(Staged {
                payload: PayloadRef::Link(url.clone()),
                mime_type: None,
                byte_size: None,
            }),
        }
    }

    /// Best-effort removal of a payload's backing asset. The database row is
    /// authoritative, so a missing or undeletable file is only logged.
    async fn discard(&self, payload: &PayloadRef) {
        if let Some(key) = payload.asset_key() {
            if let Err(e) = self.assets.delete(key).await {
                tracing::warn!(key, error = %e, "failed to remove backing asset");
            }
        }
    }
}

fn validate_payload(kind: MediaKind, payload: &NewPayload) -> Result<(), MediaError> {
    match payload {
        NewPayload::Upload {
            data, mime_type, ..
        } => {
            if data.is_empty() {
                return Err(MediaError::InvalidPayload("empty upload".into()));
            }
            if !kind.accepts_mime(mime_type) {
                return Err(MediaError::InvalidPayload(format!(
                    "{mime_type} is not accepted for {kind}"
                )));
            }
        }
        NewPayload::Link { url } => {
            if !kind.accepts_links() {
                return Err(MediaError::InvalidPayload(format!(
                    "{kind} does not accept links"
                )));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MediaError::InvalidPayload(
                    "link must be an http(s) URL".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Asset keys carry the sanitized original filename after a UUID so served
/// content can be classified by extension.
fn asset_key(file_name: Option<&str>) -> String {
    let name = file_name.unwrap_or("asset");
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .take(80)
        .collect();
    format!("{}-{sanitized}", uuid::Uuid::new_v4())
}
