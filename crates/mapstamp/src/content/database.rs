use std::collections::HashMap;

use super::records::{
    LevelPresetRecord, LevelTypeRecord, MonStatRecord, ObjectLookupRecord, ObjectRecord, RegionId,
};

/// Read-only dictionary lookups a stamp needs while loading and spawning.
pub trait ContentLookup {
    fn level_type(&self, id: RegionId) -> Option<&LevelTypeRecord>;

    fn level_preset(&self, definition_id: i32) -> Option<&LevelPresetRecord>;

    /// Monster-stat key placed by layout object `id` in `act`.
    fn monster_preset(&self, act: i32, id: i32) -> Option<&str>;

    fn monster_stats(&self, key: &str) -> Option<&MonStatRecord>;

    fn object_lookup(&self, act: i32, object_type: i32, id: i32) -> Option<&ObjectLookupRecord>;

    fn object(&self, index: i32) -> Option<&ObjectRecord>;
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    level_types: HashMap<RegionId, LevelTypeRecord>,
    level_presets: HashMap<i32, LevelPresetRecord>,
    monster_presets: HashMap<i32, Vec<String>>,
    monster_stats: HashMap<String, MonStatRecord>,
    object_lookups: HashMap<(i32, i32, i32), ObjectLookupRecord>,
    objects: HashMap<i32, ObjectRecord>,
}

impl DefDatabase {
    pub fn insert_level_type(&mut self, record: LevelTypeRecord) {
        self.level_types.insert(record.id, record);
    }

    pub fn insert_level_preset(&mut self, record: LevelPresetRecord) {
        self.level_presets.insert(record.definition_id, record);
    }

    /// Replaces the ordered monster-preset list of `act`.
    pub fn set_monster_presets(&mut self, act: i32, places: Vec<String>) {
        self.monster_presets.insert(act, places);
    }

    pub fn insert_monster_stats(&mut self, record: MonStatRecord) {
        self.monster_stats.insert(record.key.clone(), record);
    }

    pub fn insert_object_lookup(&mut self, record: ObjectLookupRecord) {
        self.object_lookups
            .insert((record.act, record.object_type, record.id), record);
    }

    pub fn insert_object(&mut self, record: ObjectRecord) {
        self.objects.insert(record.index, record);
    }

    pub fn level_type_count(&self) -> usize {
        self.level_types.len()
    }

    pub fn level_preset_count(&self) -> usize {
        self.level_presets.len()
    }

    pub fn monster_stats_count(&self) -> usize {
        self.monster_stats.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl ContentLookup for DefDatabase {
    fn level_type(&self, id: RegionId) -> Option<&LevelTypeRecord> {
        self.level_types.get(&id)
    }

    fn level_preset(&self, definition_id: i32) -> Option<&LevelPresetRecord> {
        self.level_presets.get(&definition_id)
    }

    fn monster_preset(&self, act: i32, id: i32) -> Option<&str> {
        let index = usize::try_from(id).ok()?;
        self.monster_presets
            .get(&act)?
            .get(index)
            .map(String::as_str)
    }

    fn monster_stats(&self, key: &str) -> Option<&MonStatRecord> {
        self.monster_stats.get(key)
    }

    fn object_lookup(&self, act: i32, object_type: i32, id: i32) -> Option<&ObjectLookupRecord> {
        self.object_lookups.get(&(act, object_type, id))
    }

    fn object(&self, index: i32) -> Option<&ObjectRecord> {
        self.objects.get(&index)
    }
}
