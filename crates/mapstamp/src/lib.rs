pub mod archive;
pub mod config;
pub mod content;
pub mod formats;
pub mod stamp;

#[cfg(test)]
mod test_support;

pub use archive::{normalize_asset_path, AssetError, AssetSource, DirectoryArchive, MemoryArchive};
pub use config::{ConfigError, StampConfig, NO_FILE_SENTINEL, TILES_PER_STAMP_UNIT};
pub use content::{
    compile_def_database, ContentCompileError, ContentErrorCode, ContentLookup, DefDatabase,
    LevelPresetRecord, LevelTypeRecord, MonStatRecord, ObjectLookupRecord, ObjectRecord, RegionId,
    SourceLocation,
};
pub use formats::{
    DecodeError, Ds1Decoder, Dt1Decoder, LayerTile, Layout, LayoutCell, LayoutDecoder,
    ObjectPlacement, PathPoint, PlacementKind, SubstitutionGroup, TileBlock, TileDecoder,
    TileRecord, WallTile,
};
pub use stamp::{
    convert_paths, load_stamp, select_variant, usable_files, EntityFactory, EntitySpawn, NpcSpawn,
    ObjectSpawn, SpawnError, SpawnListFactory, Stamp, StampError, StampErrorKind, StampLoader,
    StampRequest, StampSize,
};

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::test_support::{Ds1Builder, Dt1Builder, TileSpec};

    fn write(root: &std::path::Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, bytes).expect("write");
    }

    #[test]
    fn stamps_from_extracted_data_tree_and_xml_defs() {
        let temp = TempDir::new().expect("temp");
        write(
            temp.path(),
            "defs/levels.xml",
            br#"<Defs>
                <LevelType><id>1</id><name>Town</name><act>1</act>
                    <files><li>A1\Town.dt1</li><li>0</li></files></LevelType>
                <LevelPreset><defId>1</defId><name>Rogue Camp</name>
                    <files><li>A1\Camp.ds1</li></files></LevelPreset>
                <MonPreset><act>1</act><places><li>akara</li></places></MonPreset>
                <MonStat><key>akara</key><name>Akara</name><npc>1</npc></MonStat>
            </Defs>"#,
        );
        write(
            temp.path(),
            "data/global/tiles/a1/town.dt1",
            &Dt1Builder::new().tile(TileSpec::new(0, 0, 0)).build(),
        );
        write(
            temp.path(),
            "data/global/tiles/A1/Camp.ds1",
            &Ds1Builder::new(2, 2)
                .object(1, 0, 4, 6)
                .npc_path(4, 6, &[(1, 5, 6)])
                .build(),
        );

        let db = compile_def_database(&temp.path().join("defs")).expect("defs");
        let archive = DirectoryArchive::new(temp.path());
        let stamp = load_stamp(&archive, &db, RegionId(1), 1, None).expect("stamp");

        assert_eq!(stamp.region_path(), "A1\\Camp.ds1");
        assert_eq!(stamp.tiles().len(), 1);
        let entities = stamp
            .entities(1, 1, &db, &mut SpawnListFactory)
            .expect("entities");
        match &entities[..] {
            [EntitySpawn::Npc(npc)] => {
                assert_eq!((npc.x, npc.y), (9, 11));
                assert_eq!(npc.stats.name, "Akara");
                assert_eq!(npc.path, vec![PathPoint { action: 1, x: 10, y: 11 }]);
            }
            other => panic!("unexpected entities {other:?}"),
        }
    }
}
