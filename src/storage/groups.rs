use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{MediaGroupRecord, MediaKind};
use super::tables::*;

impl Database {
    // ========================================================================
    // Media group operations
    // ========================================================================

    /// Look up the media group for (user, kind), if it has been created.
    pub fn get_group(
        &self,
        user_id: &str,
        kind: MediaKind,
    ) -> Result<Option<MediaGroupRecord>, DatabaseError> {
        let key = MediaGroupRecord::storage_key(user_id, kind);
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(MEDIA_GROUPS)?;

        match table.get(key.as_str())? {
            Some(data) => {
                let group: MediaGroupRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(group))
            }
            None => Ok(None),
        }
    }

    /// Resolve the media group for (user, kind), creating it lazily on first
    /// write. The re-check inside the write transaction keeps concurrent
    /// creators from racing to two different group ids.
    pub fn get_or_create_group(
        &self,
        user_id: &str,
        kind: MediaKind,
    ) -> Result<MediaGroupRecord, DatabaseError> {
        if let Some(group) = self.get_group(user_id, kind)? {
            return Ok(group);
        }

        let key = MediaGroupRecord::storage_key(user_id, kind);
        let write_txn = self.begin_write()?;
        let group = {
            let mut table = write_txn.open_table(MEDIA_GROUPS)?;

            let existing: Option<MediaGroupRecord> = match table.get(key.as_str())? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                Some(group) => group,
                None => {
                    let group = MediaGroupRecord {
                        id: uuid::Uuid::new_v4().to_string(),
                        user_id: user_id.to_string(),
                        kind,
                        created_at: Utc::now(),
                    };
                    let data = rmp_serde::to_vec_named(&group)?;
                    table.insert(key.as_str(), data.as_slice())?;
                    group
                }
            }
        };
        write_txn.commit()?;
        Ok(group)
    }

    /// Remove the group row itself. Slot rows are drained separately via
    /// `delete_group_slots`; returns false if the group never existed.
    pub fn delete_group(&self, user_id: &str, kind: MediaKind) -> Result<bool, DatabaseError> {
        let key = MediaGroupRecord::storage_key(user_id, kind);
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(MEDIA_GROUPS)?;
            let removed = table.remove(key.as_str())?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}
