//! Decoders for the two asset formats a stamp is assembled from: DT1 tile
//! graphics and DS1 layouts.

mod ds1;
mod dt1;
mod reader;

use thiserror::Error;

pub use ds1::{
    Ds1Decoder, LayerTile, Layout, LayoutCell, ObjectPlacement, PathPoint, PlacementKind,
    SubstitutionGroup, WallTile,
};
pub use dt1::{Dt1Decoder, TileBlock, TileRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("asset {path} is malformed at byte {offset}: {message}")]
pub struct DecodeError {
    pub path: String,
    pub offset: usize,
    pub message: String,
}

pub trait TileDecoder {
    fn decode_tiles(&self, path: &str, bytes: &[u8]) -> Result<Vec<TileRecord>, DecodeError>;
}

pub trait LayoutDecoder {
    fn decode_layout(&self, path: &str, bytes: &[u8]) -> Result<Layout, DecodeError>;
}
