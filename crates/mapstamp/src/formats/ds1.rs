use crate::content::RegionId;

use super::reader::ByteReader;
use super::{DecodeError, LayoutDecoder};

const MAX_ACT: i32 = 5;
const DEFAULT_PATH_ACTION: i32 = 1;

// Orientation remap for layouts saved before version 7.
const LEGACY_DIRECTIONS: [u8; 25] = [
    0x00, 0x01, 0x02, 0x01, 0x02, 0x03, 0x03, 0x05, 0x05, 0x06, 0x06, 0x07, 0x07, 0x08, 0x09, 0x0A,
    0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x14,
];

/// Floor, shadow or wall entry of one layout cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTile {
    pub prop1: u8,
    pub sequence: u8,
    pub unknown1: u8,
    pub style: u8,
    pub unknown2: u8,
    pub hidden: bool,
}

impl LayerTile {
    fn from_word(word: u32) -> Self {
        Self {
            prop1: (word & 0xFF) as u8,
            sequence: ((word >> 8) & 0x3F) as u8,
            unknown1: ((word >> 14) & 0x3F) as u8,
            style: ((word >> 20) & 0x3F) as u8,
            unknown2: ((word >> 26) & 0x1F) as u8,
            hidden: (word >> 31) != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallTile {
    pub tile: LayerTile,
    pub orientation: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutCell {
    pub floors: Vec<LayerTile>,
    pub walls: Vec<WallTile>,
    pub shadows: Vec<LayerTile>,
    pub substitutions: Vec<u32>,
    pub region: RegionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Character,
    Item,
    Other(i32),
}

impl PlacementKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Character,
            2 => Self::Item,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Character => 1,
            Self::Item => 2,
            Self::Other(other) => other,
        }
    }
}

/// Waypoint of a creature path. Coordinates share the owner's space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPoint {
    pub action: i32,
    pub x: i32,
    pub y: i32,
}

/// Spawn descriptor embedded in a layout, in local sub-tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPlacement {
    pub kind: PlacementKind,
    pub id: i32,
    pub x: i32,
    pub y: i32,
    pub flags: i32,
    pub path: Vec<PathPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionGroup {
    pub tile_x: i32,
    pub tile_y: i32,
    pub width_in_tiles: i32,
    pub height_in_tiles: i32,
    pub unknown: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub version: i32,
    pub act: i32,
    pub substitution_type: i32,
    pub width: usize,
    pub height: usize,
    pub files: Vec<String>,
    pub cells: Vec<LayoutCell>,
    pub objects: Vec<ObjectPlacement>,
    pub substitution_groups: Vec<SubstitutionGroup>,
}

impl Layout {
    pub fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&LayoutCell> {
        self.index_of(x, y).and_then(|index| self.cells.get(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerStream {
    Wall(usize),
    Orientation(usize),
    Floor(usize),
    Shadow,
    Substitution,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ds1Decoder;

impl LayoutDecoder for Ds1Decoder {
    fn decode_layout(&self, path: &str, bytes: &[u8]) -> Result<Layout, DecodeError> {
        let mut reader = ByteReader::new(path, bytes);

        let version = reader.read_i32()?;
        let width = read_dimension(&mut reader, "width")?;
        let height = read_dimension(&mut reader, "height")?;
        let act = if version >= 8 {
            reader.read_i32()?.saturating_add(1).min(MAX_ACT)
        } else {
            1
        };
        let substitution_type = if version >= 10 { reader.read_i32()? } else { 0 };
        let has_substitution_layer = matches!(substitution_type, 1 | 2);

        let mut files = Vec::new();
        if version >= 3 {
            let file_count = reader.read_len("file count")?;
            for _ in 0..file_count {
                files.push(reader.read_cstring()?);
            }
        }
        if (9..=13).contains(&version) {
            reader.skip(8)?;
        }

        let cell_count = width
            .checked_mul(height)
            .ok_or_else(|| reader.error(format!("{width}x{height} layout exceeds file size")))?;
        let stream = layer_stream(&mut reader, version, has_substitution_layer, cell_count)?;
        let mut cells = vec![LayoutCell::default(); cell_count];
        for layer in &stream {
            for cell in cells.iter_mut() {
                let word = reader.read_u32()?;
                apply_layer_word(cell, *layer, word, version);
            }
        }

        let mut objects = Vec::new();
        if version >= 2 {
            let object_count = reader.read_len("object count")?;
            for _ in 0..object_count {
                let kind = PlacementKind::from_raw(reader.read_i32()?);
                let id = reader.read_i32()?;
                let x = reader.read_i32()?;
                let y = reader.read_i32()?;
                let flags = if version > 5 { reader.read_i32()? } else { 0 };
                objects.push(ObjectPlacement {
                    kind,
                    id,
                    x,
                    y,
                    flags,
                    path: Vec::new(),
                });
            }
        }

        let mut substitution_groups = Vec::new();
        if version >= 12 && has_substitution_layer {
            if version >= 18 {
                reader.skip(4)?;
            }
            let group_count = reader.read_len("substitution group count")?;
            for _ in 0..group_count {
                substitution_groups.push(SubstitutionGroup {
                    tile_x: reader.read_i32()?,
                    tile_y: reader.read_i32()?,
                    width_in_tiles: reader.read_i32()?,
                    height_in_tiles: reader.read_i32()?,
                    unknown: reader.read_i32()?,
                });
            }
        }

        if version >= 14 {
            read_npc_paths(&mut reader, version, &mut objects)?;
        }

        Ok(Layout {
            version,
            act,
            substitution_type,
            width,
            height,
            files,
            cells,
            objects,
            substitution_groups,
        })
    }
}

fn read_dimension(reader: &mut ByteReader<'_>, what: &str) -> Result<usize, DecodeError> {
    let offset = reader.position();
    let raw = reader.read_i32()?;
    match raw.checked_add(1).and_then(|value| usize::try_from(value).ok()) {
        Some(value) if value > 0 => Ok(value),
        _ => Err(reader.error_at(offset, format!("invalid layout {what} {raw}"))),
    }
}

fn layer_stream(
    reader: &mut ByteReader<'_>,
    version: i32,
    has_substitution_layer: bool,
    cell_count: usize,
) -> Result<Vec<LayerStream>, DecodeError> {
    if version < 4 {
        ensure_layers_fit(reader, 5, cell_count)?;
        return Ok(vec![
            LayerStream::Wall(0),
            LayerStream::Floor(0),
            LayerStream::Orientation(0),
            LayerStream::Substitution,
            LayerStream::Shadow,
        ]);
    }

    let wall_count = reader.read_len("wall layer count")?;
    let floor_count = if version >= 16 {
        reader.read_len("floor layer count")?
    } else {
        1
    };
    let layer_count = wall_count
        .checked_mul(2)
        .and_then(|count| count.checked_add(floor_count))
        .and_then(|count| count.checked_add(1 + usize::from(has_substitution_layer)))
        .ok_or_else(|| {
            reader.error(format!(
                "{wall_count} wall and {floor_count} floor layers exceed file size"
            ))
        })?;
    ensure_layers_fit(reader, layer_count, cell_count)?;

    let mut stream = Vec::with_capacity(layer_count);
    for index in 0..wall_count {
        stream.push(LayerStream::Wall(index));
        stream.push(LayerStream::Orientation(index));
    }
    stream.extend((0..floor_count).map(LayerStream::Floor));
    stream.push(LayerStream::Shadow);
    if has_substitution_layer {
        stream.push(LayerStream::Substitution);
    }
    Ok(stream)
}

/// Every layer stores one `u32` per cell; the words must all be present.
fn ensure_layers_fit(
    reader: &ByteReader<'_>,
    layer_count: usize,
    cell_count: usize,
) -> Result<(), DecodeError> {
    let needed = layer_count
        .checked_mul(cell_count)
        .and_then(|words| words.checked_mul(4));
    match needed {
        Some(bytes) if bytes <= reader.remaining() => Ok(()),
        _ => Err(reader.error(format!(
            "{cell_count}-cell layout with {layer_count} layers exceeds file size ({} bytes left)",
            reader.remaining()
        ))),
    }
}

fn apply_layer_word(cell: &mut LayoutCell, layer: LayerStream, word: u32, version: i32) {
    match layer {
        LayerStream::Wall(index) => {
            grow_to(&mut cell.walls, index);
            cell.walls[index].tile = LayerTile::from_word(word);
        }
        LayerStream::Orientation(index) => {
            grow_to(&mut cell.walls, index);
            let mut orientation = (word & 0xFF) as u8;
            if version < 7 {
                if let Some(mapped) = LEGACY_DIRECTIONS.get(orientation as usize) {
                    orientation = *mapped;
                }
            }
            cell.walls[index].orientation = orientation;
        }
        LayerStream::Floor(index) => {
            grow_to(&mut cell.floors, index);
            cell.floors[index] = LayerTile::from_word(word);
        }
        LayerStream::Shadow => cell.shadows.push(LayerTile::from_word(word)),
        LayerStream::Substitution => cell.substitutions.push(word),
    }
}

fn grow_to<T: Default + Clone>(layers: &mut Vec<T>, index: usize) {
    if layers.len() <= index {
        layers.resize(index + 1, T::default());
    }
}

fn read_npc_paths(
    reader: &mut ByteReader<'_>,
    version: i32,
    objects: &mut [ObjectPlacement],
) -> Result<(), DecodeError> {
    let npc_count = reader.read_len("npc count")?;
    for _ in 0..npc_count {
        let path_count = reader.read_len("npc path count")?;
        let npc_x = reader.read_i32()?;
        let npc_y = reader.read_i32()?;

        let mut path = Vec::with_capacity(path_count.min(reader.remaining() / 8));
        for _ in 0..path_count {
            let x = reader.read_i32()?;
            let y = reader.read_i32()?;
            let action = if version >= 15 {
                reader.read_i32()?
            } else {
                DEFAULT_PATH_ACTION
            };
            path.push(PathPoint { action, x, y });
        }

        // Paths belong to the first object standing on the NPC's position.
        if let Some(owner) = objects
            .iter_mut()
            .find(|object| object.x == npc_x && object.y == npc_y)
        {
            owner.path = path;
        }
    }
    Ok(())
}
