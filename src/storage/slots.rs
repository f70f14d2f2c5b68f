use std::collections::BTreeSet;

use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::SlotRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Slot row operations
    // ========================================================================

    /// Insert a slot row iff its index is vacant. Returns Ok(false) when the
    /// index is already occupied for the group; the check and the insert
    /// share one write transaction, so this is the authoritative uniqueness
    /// guard for concurrent adds.
    pub fn insert_slot(&self, slot: &SlotRecord) -> Result<bool, DatabaseError> {
        debug_assert!(!slot.group_id.is_empty(), "slot group id must not be empty");

        let write_txn = self.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(GROUP_SLOTS)?;
            let key = (slot.group_id.as_str(), slot.index);
            if table.get(&key)?.is_some() {
                false
            } else {
                let data = rmp_serde::to_vec_named(slot)?;
                table.insert(&key, data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Overwrite the row at the slot's index. Returns Ok(false) if there is
    /// no live row there; replace never creates slots.
    pub fn update_slot(&self, slot: &SlotRecord) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(GROUP_SLOTS)?;
            let key = (slot.group_id.as_str(), slot.index);
            if table.get(&key)?.is_none() {
                false
            } else {
                let data = rmp_serde::to_vec_named(slot)?;
                table.insert(&key, data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Get the slot at (group, index)
    pub fn get_slot(&self, group_id: &str, index: u32) -> Result<Option<SlotRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(GROUP_SLOTS)?;

        match table.get(&(group_id, index))? {
            Some(data) => {
                let slot: SlotRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(slot))
            }
            None => Ok(None),
        }
    }

    /// Remove the slot at (group, index), returning the removed row so the
    /// caller can clean up its backing asset.
    pub fn delete_slot(
        &self,
        group_id: &str,
        index: u32,
    ) -> Result<Option<SlotRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(GROUP_SLOTS)?;
            let removed: Option<SlotRecord> = match table.remove(&(group_id, index))? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Remove every slot row for the group, returning the removed rows for
    /// asset cleanup.
    pub fn delete_group_slots(&self, group_id: &str) -> Result<Vec<SlotRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let table = write_txn.open_table(GROUP_SLOTS)?;
            let mut rows: Vec<SlotRecord> = Vec::new();
            for result in table.range((group_id, 0)..=(group_id, u32::MAX))? {
                let (_, value) = result?;
                rows.push(rmp_serde::from_slice(value.value())?);
            }
            drop(table);

            let mut table = write_txn.open_table(GROUP_SLOTS)?;
            for slot in &rows {
                table.remove(&(group_id, slot.index))?;
            }
            rows
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// All live slots for the group, ordered by index.
    pub fn list_slots(&self, group_id: &str) -> Result<Vec<SlotRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(GROUP_SLOTS)?;

        let mut slots = Vec::new();
        for result in table.range((group_id, 0)..=(group_id, u32::MAX))? {
            let (_, value) = result?;
            let slot: SlotRecord = rmp_serde::from_slice(value.value())?;
            slots.push(slot);
        }

        Ok(slots)
    }

    /// The set of indices currently occupied for the group.
    pub fn occupied_indices(&self, group_id: &str) -> Result<BTreeSet<u32>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(GROUP_SLOTS)?;

        let mut occupied = BTreeSet::new();
        for result in table.range((group_id, 0)..=(group_id, u32::MAX))? {
            let (key, _) = result?;
            occupied.insert(key.value().1);
        }

        Ok(occupied)
    }
}
