use std::fmt;

/// Numeric region archetype (level type) id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub i32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A region archetype and the DT1 files valid for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTypeRecord {
    pub id: RegionId,
    pub name: String,
    pub act: i32,
    pub files: Vec<String>,
    pub beta: bool,
    pub expansion: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelPresetRecord {
    pub definition_id: i32,
    pub level_id: i32,
    pub name: String,
    pub populate: bool,
    pub logicals: bool,
    pub outdoors: bool,
    pub animate: bool,
    pub kill_edge: bool,
    pub fill_blanks: bool,
    pub size_x: i32,
    pub size_y: i32,
    pub automap: bool,
    pub scan: bool,
    pub pops: i32,
    pub pop_pad: i32,
    /// Candidate DS1 layouts; empty and `"0"` slots are unused.
    pub files: Vec<String>,
    pub dt1_mask: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonStatRecord {
    pub key: String,
    pub name: String,
    pub code: String,
    pub base_key: String,
    pub velocity: i32,
    pub run_velocity: i32,
    pub npc: bool,
}

/// Maps a layout object id to an entry of the object table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectLookupRecord {
    pub act: i32,
    pub object_type: i32,
    pub id: i32,
    pub description: String,
    pub objects_txt_id: i32,
    pub monstats_txt_id: i32,
    pub direction: i32,
    pub base: String,
    pub token: String,
    pub mode: String,
    pub class: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRecord {
    pub index: i32,
    pub name: String,
    pub token: String,
    pub size_x: i32,
    pub size_y: i32,
    pub sub_class: i32,
}
