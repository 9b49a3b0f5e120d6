//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, config and raster-engine errors, and provides
//! semantic variants for every way a scene can fail on its way to ARD.
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Band;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Raster engine error: {0}")]
    Engine(#[from] crate::io::EngineError),

    #[error("Archive extraction failed for {archive:?} (exit code {code}): {stderr}")]
    Archive {
        archive: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("Cannot parse {field} from filename: {name}")]
    MetadataParse { field: &'static str, name: String },

    #[error("Unknown platform code: {code}")]
    UnknownPlatform { code: String },

    #[error("Scene is neither a Pleiades nor a SPOT product: {name}")]
    UnsupportedScene { name: String },

    #[error("Incomplete tile grid for band {band}: {tiles} tile(s) for a {rows}x{cols} grid")]
    IncompleteTileGrid {
        band: Band,
        tiles: usize,
        rows: u32,
        cols: u32,
    },

    #[error("Region of interest does not overlap {band} image: {image:?}")]
    RoiMiss { band: Band, image: PathBuf },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },
}
