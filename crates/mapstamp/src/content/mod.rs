mod compiler;
mod database;
mod records;

pub use compiler::{compile_def_database, ContentCompileError, ContentErrorCode, SourceLocation};
pub use database::{ContentLookup, DefDatabase};
pub use records::{
    LevelPresetRecord, LevelTypeRecord, MonStatRecord, ObjectLookupRecord, ObjectRecord, RegionId,
};
