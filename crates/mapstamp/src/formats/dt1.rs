use super::reader::ByteReader;
use super::{DecodeError, TileDecoder};

const MAJOR_VERSION: i32 = 7;
const MINOR_VERSION: i32 = 6;
const HEADER_RESERVED_BYTES: usize = 260;
const SUB_TILE_COUNT: usize = 25;

/// One graphical tile variant. `(style, sequence, tile_type)` identifies the
/// tile but is not unique within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    pub direction: i32,
    pub roof_height: i16,
    pub material_flags: u16,
    pub height: i32,
    pub width: i32,
    pub tile_type: i32,
    pub style: i32,
    pub sequence: i32,
    pub rarity_frame_index: i32,
    pub sub_tile_flags: [u8; SUB_TILE_COUNT],
    pub blocks: Vec<TileBlock>,
}

impl TileRecord {
    pub fn matches(&self, style: i32, sequence: i32, tile_type: i32) -> bool {
        self.style == style && self.sequence == sequence && self.tile_type == tile_type
    }
}

/// Encoded pixel block; the payload is kept as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBlock {
    pub x: i16,
    pub y: i16,
    pub grid_x: u8,
    pub grid_y: u8,
    pub format: i16,
    pub encoded_data: Vec<u8>,
}

struct PendingBlocks {
    header_offset: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Dt1Decoder;

impl TileDecoder for Dt1Decoder {
    fn decode_tiles(&self, path: &str, bytes: &[u8]) -> Result<Vec<TileRecord>, DecodeError> {
        let mut reader = ByteReader::new(path, bytes);

        let major = reader.read_i32()?;
        let minor = reader.read_i32()?;
        if major != MAJOR_VERSION || minor != MINOR_VERSION {
            return Err(DecodeError {
                path: path.to_string(),
                offset: 0,
                message: format!(
                    "unsupported DT1 version {major}.{minor}; expected {MAJOR_VERSION}.{MINOR_VERSION}"
                ),
            });
        }
        reader.skip(HEADER_RESERVED_BYTES)?;
        let tile_count = reader.read_len("tile count")?;
        let tile_header_offset = reader.read_len("tile header offset")?;
        reader.seek(tile_header_offset)?;

        let mut tiles = Vec::<TileRecord>::with_capacity(tile_count.min(reader.remaining() / 96));
        let mut pending = Vec::<PendingBlocks>::with_capacity(tiles.capacity());
        for _ in 0..tile_count {
            let direction = reader.read_i32()?;
            let roof_height = reader.read_i16()?;
            let material_flags = reader.read_u16()?;
            let height = reader.read_i32()?;
            let width = reader.read_i32()?;
            reader.skip(4)?;
            let tile_type = reader.read_i32()?;
            let style = reader.read_i32()?;
            let sequence = reader.read_i32()?;
            let rarity_frame_index = reader.read_i32()?;
            reader.skip(4)?;
            let sub_tile_flags = reader.read_array::<SUB_TILE_COUNT>()?;
            reader.skip(7)?;
            let block_header_offset = reader.read_len("block header offset")?;
            let _block_data_size = reader.read_i32()?;
            let block_count = reader.read_len("block count")?;
            reader.skip(12)?;

            tiles.push(TileRecord {
                direction,
                roof_height,
                material_flags,
                height,
                width,
                tile_type,
                style,
                sequence,
                rarity_frame_index,
                sub_tile_flags,
                blocks: Vec::new(),
            });
            pending.push(PendingBlocks {
                header_offset: block_header_offset,
                count: block_count,
            });
        }

        for (tile, blocks) in tiles.iter_mut().zip(pending) {
            tile.blocks = read_blocks(&mut reader, &blocks)?;
        }

        Ok(tiles)
    }
}

fn read_blocks(
    reader: &mut ByteReader<'_>,
    pending: &PendingBlocks,
) -> Result<Vec<TileBlock>, DecodeError> {
    if pending.count == 0 {
        return Ok(Vec::new());
    }
    reader.seek(pending.header_offset)?;

    let mut headers = Vec::<(TileBlock, usize, usize)>::new();
    for _ in 0..pending.count {
        let x = reader.read_i16()?;
        let y = reader.read_i16()?;
        reader.skip(2)?;
        let grid_x = reader.read_u8()?;
        let grid_y = reader.read_u8()?;
        let format = reader.read_i16()?;
        let length = reader.read_len("block length")?;
        reader.skip(2)?;
        let data_offset = reader.read_len("block data offset")?;
        headers.push((
            TileBlock {
                x,
                y,
                grid_x,
                grid_y,
                format,
                encoded_data: Vec::new(),
            },
            data_offset,
            length,
        ));
    }

    let mut blocks = Vec::with_capacity(headers.len());
    for (mut block, data_offset, length) in headers {
        reader.seek(pending.header_offset.saturating_add(data_offset))?;
        block.encoded_data = reader.read_exact(length)?.to_vec();
        blocks.push(block);
    }
    Ok(blocks)
}
