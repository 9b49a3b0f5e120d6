use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::BoundingBox;
use crate::types::{CalibrationLevel, PanMethod, PixelEncoding, PleiadesFusion, RoiMissPolicy};

/// Run configuration for one scene, suitable for JSON config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding (or receiving) SRTM elevation tiles
    pub dem_path: Option<PathBuf>,
    /// Geoid grid; elevation is only used when both DEM and geoid are set
    pub geoid_path: Option<PathBuf>,
    /// Pansharpening method; engine default when None
    pub pan_method: Option<PanMethod>,
    /// Optional clip region applied to every band mosaic
    pub roi: Option<BoundingBox>,
    pub roi_miss: RoiMissPolicy,
    /// Engine working-memory budget in megabytes
    pub ram_mb: u32,
    /// Directory receiving one log file per scene
    pub log_dir: PathBuf,
    pub calibration_level: CalibrationLevel,
    pub encoding: PixelEncoding,
    pub pleiades_fusion: PleiadesFusion,
    /// Root receiving published products under `<norad>/<datetime>/`
    pub ard_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dem_path: None,
            geoid_path: None,
            pan_method: None,
            roi: None,
            roi_miss: RoiMissPolicy::Abort,
            ram_mb: 4096,
            log_dir: PathBuf::from("log"),
            calibration_level: CalibrationLevel::Toa,
            encoding: PixelEncoding::ScaledU16,
            pleiades_fusion: PleiadesFusion::Superimpose,
            ard_dir: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
