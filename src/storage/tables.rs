use redb::TableDefinition;

/// Media groups: "{user_id}/{kind}" -> MediaGroupRecord (msgpack)
pub const MEDIA_GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("media_groups");

/// Slot rows: (group id, slot index) -> SlotRecord (msgpack).
/// The composite key makes per-group scans come back ordered by index.
pub const GROUP_SLOTS: TableDefinition<(&str, u32), &[u8]> = TableDefinition::new("group_slots");
