//! Byte builders and dictionary fixtures shared by unit tests.

use crate::archive::MemoryArchive;
use crate::content::{
    DefDatabase, LevelPresetRecord, LevelTypeRecord, MonStatRecord, ObjectLookupRecord,
    ObjectRecord, RegionId,
};

pub(crate) const FIXTURE_REGION: RegionId = RegionId(2);
pub(crate) const FIXTURE_PRESET: i32 = 3;

const DT1_HEADER_SIZE: usize = 276;
const DT1_TILE_HEADER_SIZE: usize = 96;
const DT1_BLOCK_HEADER_SIZE: usize = 20;

fn push_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_len(out: &mut Vec<u8>, value: usize) {
    push_i32(out, i32::try_from(value).expect("length fits i32"));
}

pub(crate) fn layer_word(style: u8, sequence: u8, prop1: u8, hidden: bool) -> u32 {
    u32::from(prop1)
        | (u32::from(sequence & 0x3F) << 8)
        | (u32::from(style & 0x3F) << 20)
        | (u32::from(hidden) << 31)
}

#[derive(Debug, Clone)]
pub(crate) struct BlockSpec {
    pub x: i16,
    pub y: i16,
    pub grid_x: u8,
    pub grid_y: u8,
    pub format: i16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub(crate) struct TileSpec {
    pub direction: i32,
    pub roof_height: i16,
    pub material_flags: u16,
    pub height: i32,
    pub width: i32,
    pub tile_type: i32,
    pub style: i32,
    pub sequence: i32,
    pub rarity_frame_index: i32,
    pub sub_tile_flags: [u8; 25],
    pub blocks: Vec<BlockSpec>,
}

impl TileSpec {
    pub(crate) fn new(style: i32, sequence: i32, tile_type: i32) -> Self {
        Self {
            direction: 0,
            roof_height: 0,
            material_flags: 0,
            height: -80,
            width: 160,
            tile_type,
            style,
            sequence,
            rarity_frame_index: 0,
            sub_tile_flags: [0; 25],
            blocks: Vec::new(),
        }
    }

    pub(crate) fn with_block(mut self, data: Vec<u8>) -> Self {
        self.blocks.push(BlockSpec {
            x: 0,
            y: 0,
            grid_x: 0,
            grid_y: 0,
            format: 1,
            data,
        });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Dt1Builder {
    tiles: Vec<TileSpec>,
}

impl Dt1Builder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tile(mut self, spec: TileSpec) -> Self {
        self.tiles.push(spec);
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_i32(&mut out, 7);
        push_i32(&mut out, 6);
        out.extend_from_slice(&[0u8; 260]);
        push_len(&mut out, self.tiles.len());
        push_len(&mut out, DT1_HEADER_SIZE);

        let mut block_offset = DT1_HEADER_SIZE + DT1_TILE_HEADER_SIZE * self.tiles.len();
        let mut block_sections = Vec::<u8>::new();
        for tile in &self.tiles {
            let section = block_section(&tile.blocks);

            push_i32(&mut out, tile.direction);
            push_i16(&mut out, tile.roof_height);
            out.extend_from_slice(&tile.material_flags.to_le_bytes());
            push_i32(&mut out, tile.height);
            push_i32(&mut out, tile.width);
            out.extend_from_slice(&[0u8; 4]);
            push_i32(&mut out, tile.tile_type);
            push_i32(&mut out, tile.style);
            push_i32(&mut out, tile.sequence);
            push_i32(&mut out, tile.rarity_frame_index);
            out.extend_from_slice(&[0u8; 4]);
            out.extend_from_slice(&tile.sub_tile_flags);
            out.extend_from_slice(&[0u8; 7]);
            push_len(&mut out, block_offset);
            push_len(&mut out, section.len());
            push_len(&mut out, tile.blocks.len());
            out.extend_from_slice(&[0u8; 12]);

            block_offset += section.len();
            block_sections.extend(section);
        }
        out.extend(block_sections);
        out
    }
}

/// Block headers followed by their payloads; data offsets are relative to
/// the first header.
fn block_section(blocks: &[BlockSpec]) -> Vec<u8> {
    let mut headers = Vec::new();
    let mut data = Vec::new();
    let mut data_offset = DT1_BLOCK_HEADER_SIZE * blocks.len();
    for block in blocks {
        push_i16(&mut headers, block.x);
        push_i16(&mut headers, block.y);
        headers.extend_from_slice(&[0u8; 2]);
        headers.push(block.grid_x);
        headers.push(block.grid_y);
        push_i16(&mut headers, block.format);
        push_len(&mut headers, block.data.len());
        headers.extend_from_slice(&[0u8; 2]);
        push_len(&mut headers, data_offset);

        data_offset += block.data.len();
        data.extend_from_slice(&block.data);
    }
    headers.extend(data);
    headers
}

#[derive(Debug, Clone)]
struct NpcPathSpec {
    x: i32,
    y: i32,
    points: Vec<(i32, i32, i32)>,
}

/// Writes DS1 bytes with one wall layer and one floor layer.
#[derive(Debug, Clone)]
pub(crate) struct Ds1Builder {
    version: i32,
    width: usize,
    height: usize,
    act: i32,
    substitution_type: i32,
    files: Vec<String>,
    floors: Vec<u32>,
    walls: Vec<u32>,
    orientations: Vec<u32>,
    objects: Vec<[i32; 5]>,
    groups: Vec<[i32; 5]>,
    npc_paths: Vec<NpcPathSpec>,
}

impl Ds1Builder {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            version: 18,
            width,
            height,
            act: 0,
            substitution_type: 0,
            files: Vec::new(),
            floors: vec![0; cells],
            walls: vec![0; cells],
            orientations: vec![0; cells],
            objects: Vec::new(),
            groups: Vec::new(),
            npc_paths: Vec::new(),
        }
    }

    pub(crate) fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Raw act field; layouts decode it as `act + 1`.
    pub(crate) fn act(mut self, act: i32) -> Self {
        self.act = act;
        self
    }

    pub(crate) fn substitution_type(mut self, substitution_type: i32) -> Self {
        self.substitution_type = substitution_type;
        self
    }

    pub(crate) fn file(mut self, name: &str) -> Self {
        self.files.push(name.to_string());
        self
    }

    pub(crate) fn floor_word(mut self, cell: usize, word: u32) -> Self {
        self.floors[cell] = word;
        self
    }

    pub(crate) fn wall_word(mut self, cell: usize, word: u32) -> Self {
        self.walls[cell] = word;
        self
    }

    pub(crate) fn orientation_word(mut self, cell: usize, word: u32) -> Self {
        self.orientations[cell] = word;
        self
    }

    pub(crate) fn object(mut self, kind: i32, id: i32, x: i32, y: i32) -> Self {
        self.objects.push([kind, id, x, y, 0]);
        self
    }

    pub(crate) fn substitution_group(mut self, group: [i32; 5]) -> Self {
        self.groups.push(group);
        self
    }

    /// Waypoints are `(action, x, y)`.
    pub(crate) fn npc_path(mut self, x: i32, y: i32, points: &[(i32, i32, i32)]) -> Self {
        self.npc_paths.push(NpcPathSpec {
            x,
            y,
            points: points.to_vec(),
        });
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let version = self.version;
        let has_substitution = matches!(self.substitution_type, 1 | 2);
        let cells = self.width * self.height;

        let mut out = Vec::new();
        push_i32(&mut out, version);
        push_len(&mut out, self.width - 1);
        push_len(&mut out, self.height - 1);
        if version >= 8 {
            push_i32(&mut out, self.act);
        }
        if version >= 10 {
            push_i32(&mut out, self.substitution_type);
        }
        if version >= 3 {
            push_len(&mut out, self.files.len());
            for file in &self.files {
                out.extend_from_slice(file.as_bytes());
                out.push(0);
            }
        }
        if (9..=13).contains(&version) {
            out.extend_from_slice(&[0u8; 8]);
        }

        let empty = vec![0u32; cells];
        let layers: Vec<&[u32]> = if version < 4 {
            vec![
                self.walls.as_slice(),
                self.floors.as_slice(),
                self.orientations.as_slice(),
                empty.as_slice(),
                empty.as_slice(),
            ]
        } else {
            push_i32(&mut out, 1);
            if version >= 16 {
                push_i32(&mut out, 1);
            }
            let mut layers: Vec<&[u32]> = vec![
                self.walls.as_slice(),
                self.orientations.as_slice(),
                self.floors.as_slice(),
                empty.as_slice(),
            ];
            if has_substitution {
                layers.push(empty.as_slice());
            }
            layers
        };
        for layer in layers {
            for word in layer {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }

        if version >= 2 {
            push_len(&mut out, self.objects.len());
            for [kind, id, x, y, flags] in &self.objects {
                push_i32(&mut out, *kind);
                push_i32(&mut out, *id);
                push_i32(&mut out, *x);
                push_i32(&mut out, *y);
                if version > 5 {
                    push_i32(&mut out, *flags);
                }
            }
        }

        if version >= 12 && has_substitution {
            if version >= 18 {
                out.extend_from_slice(&[0u8; 4]);
            }
            push_len(&mut out, self.groups.len());
            for group in &self.groups {
                for value in group {
                    push_i32(&mut out, *value);
                }
            }
        }

        if version >= 14 {
            push_len(&mut out, self.npc_paths.len());
            for npc in &self.npc_paths {
                push_len(&mut out, npc.points.len());
                push_i32(&mut out, npc.x);
                push_i32(&mut out, npc.y);
                for (action, x, y) in &npc.points {
                    push_i32(&mut out, *x);
                    push_i32(&mut out, *y);
                    if version >= 15 {
                        push_i32(&mut out, *action);
                    }
                }
            }
        }
        out
    }
}

/// Dictionaries for region 2 / preset 3 in act 1.
///
/// Monster presets: 0 = `gheed` (has stats), 1 = `place_fallen` (no stats).
/// Object lookups: id 4 -> object 17 `chest`, id 5 -> object 18 without a token.
pub(crate) fn fixture_database() -> DefDatabase {
    let mut db = DefDatabase::default();
    db.insert_level_type(LevelTypeRecord {
        id: FIXTURE_REGION,
        name: "Act 1 - Wilderness".to_string(),
        act: 1,
        files: vec![
            "A1\\Floor.dt1".to_string(),
            "0".to_string(),
            String::new(),
            "A1\\Walls.dt1".to_string(),
        ],
        ..LevelTypeRecord::default()
    });
    db.insert_level_preset(LevelPresetRecord {
        definition_id: FIXTURE_PRESET,
        level_id: 2,
        name: "Wilderness Camp".to_string(),
        files: vec![
            "A1\\a.ds1".to_string(),
            "A1\\b.ds1".to_string(),
            "0".to_string(),
        ],
        ..LevelPresetRecord::default()
    });
    db.set_monster_presets(1, vec!["gheed".to_string(), "place_fallen".to_string()]);
    db.insert_monster_stats(MonStatRecord {
        key: "gheed".to_string(),
        name: "Gheed".to_string(),
        base_key: "gheed".to_string(),
        npc: true,
        ..MonStatRecord::default()
    });
    db.insert_object_lookup(ObjectLookupRecord {
        act: 1,
        object_type: 2,
        id: 4,
        objects_txt_id: 17,
        ..ObjectLookupRecord::default()
    });
    db.insert_object_lookup(ObjectLookupRecord {
        act: 1,
        object_type: 2,
        id: 5,
        objects_txt_id: 18,
        ..ObjectLookupRecord::default()
    });
    db.insert_object(ObjectRecord {
        index: 17,
        name: "chest".to_string(),
        token: "CH".to_string(),
        ..ObjectRecord::default()
    });
    db.insert_object(ObjectRecord {
        index: 18,
        name: "broken".to_string(),
        ..ObjectRecord::default()
    });
    db
}

/// Archive backing [`fixture_database`] under the default tiles directory.
pub(crate) fn fixture_archive() -> MemoryArchive {
    MemoryArchive::new()
        .with_file(
            "/data/global/tiles/A1\\Floor.dt1",
            Dt1Builder::new()
                .tile(TileSpec::new(1, 0, 0))
                .tile(TileSpec::new(2, 0, 0))
                .build(),
        )
        .with_file(
            "/data/global/tiles/A1\\Walls.dt1",
            Dt1Builder::new()
                .tile(TileSpec::new(2, 0, 0).with_block(vec![1, 2]))
                .tile(TileSpec::new(3, 1, 4))
                .build(),
        )
        .with_file("/data/global/tiles/A1\\a.ds1", Ds1Builder::new(3, 2).build())
        .with_file(
            "/data/global/tiles/A1\\b.ds1",
            Ds1Builder::new(3, 2).object(1, 0, 1, 1).build(),
        )
}
