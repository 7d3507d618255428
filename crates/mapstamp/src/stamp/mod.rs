//! Stamp assembly: one prefabricated map segment with its tile graphics,
//! layout grid and embedded placements.

mod entities;
mod variant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{AssetError, AssetSource};
use crate::config::StampConfig;
use crate::content::{ContentLookup, LevelPresetRecord, LevelTypeRecord, RegionId};
use crate::formats::{
    DecodeError, Ds1Decoder, Dt1Decoder, Layout, LayoutCell, LayoutDecoder, TileDecoder,
    TileRecord,
};

pub use entities::{
    convert_paths, EntityFactory, EntitySpawn, NpcSpawn, ObjectSpawn, SpawnError, SpawnListFactory,
};
pub use variant::{select_variant, usable_files};

#[derive(Debug, Error)]
pub enum StampError {
    #[error("unknown level type {region}")]
    UnknownLevelType { region: RegionId },
    #[error("unknown level preset {preset_id}")]
    UnknownLevelPreset { preset_id: i32 },
    #[error("level preset {preset_id} ({name}) has no usable layout files")]
    NoLayoutCandidates { preset_id: i32, name: String },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampErrorKind {
    Configuration,
    MissingAsset,
    CorruptAsset,
}

impl StampError {
    pub fn kind(&self) -> StampErrorKind {
        match self {
            Self::UnknownLevelType { .. }
            | Self::UnknownLevelPreset { .. }
            | Self::NoLayoutCandidates { .. } => StampErrorKind::Configuration,
            Self::Asset(_) => StampErrorKind::MissingAsset,
            Self::Decode(_) => StampErrorKind::CorruptAsset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampRequest {
    pub region: RegionId,
    pub preset_id: i32,
    /// Fixed layout variant; `None` or an out-of-range index draws one at random.
    pub variant_index: Option<usize>,
}

impl StampRequest {
    pub fn new(region: RegionId, preset_id: i32) -> Self {
        Self {
            region,
            preset_id,
            variant_index: None,
        }
    }

    pub fn with_variant(mut self, index: usize) -> Self {
        self.variant_index = Some(index);
        self
    }
}

/// Stamp dimensions in layout cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampSize {
    pub width: usize,
    pub height: usize,
}

/// An assembled map segment. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Stamp {
    region_path: String,
    level_type: LevelTypeRecord,
    level_preset: LevelPresetRecord,
    tiles: Vec<TileRecord>,
    layout: Layout,
    tiles_per_stamp_unit: i32,
}

impl Stamp {
    pub fn size(&self) -> StampSize {
        StampSize {
            width: self.layout.width,
            height: self.layout.height,
        }
    }

    pub fn level_type(&self) -> &LevelTypeRecord {
        &self.level_type
    }

    pub fn level_preset(&self) -> &LevelPresetRecord {
        &self.level_preset
    }

    /// Layout file the variant selector chose.
    pub fn region_path(&self) -> &str {
        &self.region_path
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    /// # Panics
    ///
    /// Panics when `(x, y)` lies outside [`Stamp::size`].
    pub fn tile(&self, x: usize, y: usize) -> &LayoutCell {
        match self.layout.cell(x, y) {
            Some(cell) => cell,
            None => panic!(
                "tile ({x}, {y}) is outside the {}x{} stamp {}",
                self.layout.width, self.layout.height, self.region_path
            ),
        }
    }

    pub fn get_tile(&self, x: usize, y: usize) -> Option<&LayoutCell> {
        self.layout.cell(x, y)
    }

    /// First tile record with this key, in assembly order.
    pub fn tile_data(&self, style: i32, sequence: i32, tile_type: i32) -> Option<&TileRecord> {
        self.tiles
            .iter()
            .find(|tile| tile.matches(style, sequence, tile_type))
    }

    pub fn tiles_per_stamp_unit(&self) -> i32 {
        self.tiles_per_stamp_unit
    }
}

pub struct StampLoader<'a, A: ?Sized, C: ?Sized, T = Dt1Decoder, L = Ds1Decoder> {
    assets: &'a A,
    content: &'a C,
    tile_decoder: T,
    layout_decoder: L,
    config: StampConfig,
}

impl<'a, A, C> StampLoader<'a, A, C>
where
    A: AssetSource + ?Sized,
    C: ContentLookup + ?Sized,
{
    pub fn new(assets: &'a A, content: &'a C) -> Self {
        Self {
            assets,
            content,
            tile_decoder: Dt1Decoder,
            layout_decoder: Ds1Decoder,
            config: StampConfig::default(),
        }
    }
}

impl<'a, A, C, T, L> StampLoader<'a, A, C, T, L>
where
    A: AssetSource + ?Sized,
    C: ContentLookup + ?Sized,
    T: TileDecoder,
    L: LayoutDecoder,
{
    pub fn with_config(mut self, config: StampConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_decoders<T2, L2>(self, tile_decoder: T2, layout_decoder: L2) -> StampLoader<'a, A, C, T2, L2>
    where
        T2: TileDecoder,
        L2: LayoutDecoder,
    {
        StampLoader {
            assets: self.assets,
            content: self.content,
            tile_decoder,
            layout_decoder,
            config: self.config,
        }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Same as [`StampLoader::load`] with a `ChaCha8Rng` seeded from `seed`.
    pub fn load_seeded(&self, request: &StampRequest, seed: u64) -> Result<Stamp, StampError> {
        self.load(request, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn load<R: Rng + ?Sized>(
        &self,
        request: &StampRequest,
        rng: &mut R,
    ) -> Result<Stamp, StampError> {
        let level_type = self
            .content
            .level_type(request.region)
            .ok_or(StampError::UnknownLevelType {
                region: request.region,
            })?;
        let level_preset =
            self.content
                .level_preset(request.preset_id)
                .ok_or(StampError::UnknownLevelPreset {
                    preset_id: request.preset_id,
                })?;

        let mut tiles = Vec::<TileRecord>::new();
        for file in usable_files(&level_type.files) {
            let path = self.config.asset_path(file);
            let bytes = self.assets.load_file(&path)?;
            let decoded = self.tile_decoder.decode_tiles(&path, &bytes)?;
            debug!(
                region = %request.region,
                path = %path,
                tile_count = decoded.len(),
                "stamp_tiles_loaded"
            );
            tiles.extend(decoded);
        }

        let candidates = usable_files(&level_preset.files);
        let index = select_variant(&candidates, request.variant_index, rng).ok_or_else(|| {
            StampError::NoLayoutCandidates {
                preset_id: request.preset_id,
                name: level_preset.name.clone(),
            }
        })?;
        let region_path = candidates[index].to_string();
        debug!(
            preset_id = request.preset_id,
            variant_index = index,
            candidate_count = candidates.len(),
            region_path = %region_path,
            "stamp_variant_selected"
        );

        let layout_path = self.config.asset_path(&region_path);
        let bytes = self.assets.load_file(&layout_path)?;
        let mut layout = self.layout_decoder.decode_layout(&layout_path, &bytes)?;
        for cell in &mut layout.cells {
            cell.region = request.region;
        }

        info!(
            region = %request.region,
            preset_id = request.preset_id,
            region_path = %region_path,
            width = layout.width,
            height = layout.height,
            tile_count = tiles.len(),
            object_count = layout.objects.len(),
            "stamp_loaded"
        );

        Ok(Stamp {
            region_path,
            level_type: level_type.clone(),
            level_preset: level_preset.clone(),
            tiles,
            layout,
            tiles_per_stamp_unit: self.config.tiles_per_stamp_unit,
        })
    }
}

/// Loads one stamp with the default configuration and the thread RNG.
pub fn load_stamp<A, C>(
    assets: &A,
    content: &C,
    region: RegionId,
    preset_id: i32,
    variant_index: Option<usize>,
) -> Result<Stamp, StampError>
where
    A: AssetSource + ?Sized,
    C: ContentLookup + ?Sized,
{
    let request = StampRequest {
        region,
        preset_id,
        variant_index,
    };
    StampLoader::new(assets, content).load(&request, &mut rand::thread_rng())
}
