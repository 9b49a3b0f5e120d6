use clap::Parser;
use std::path::PathBuf;

use ardpro::types::{CalibrationLevel, PanMethod, PixelEncoding, PleiadesFusion, RoiMissPolicy};

#[derive(Parser)]
#[command(name = "ardpro", version, about = "ARDPRO CLI")]
pub struct CliArgs {
    /// Scene archive (.zip) to process (single scene mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory of scene folders, one archive per folder (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// JSON run configuration; command-line options override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding (or receiving) SRTM elevation tiles
    #[arg(long)]
    pub dem: Option<PathBuf>,

    /// Geoid grid file; elevation is used only together with --dem
    #[arg(long)]
    pub geoid: Option<PathBuf>,

    /// Pansharpening method (rcs, lmvm, bayes)
    #[arg(long, value_enum)]
    pub pan_method: Option<PanMethod>,

    /// Region of interest as min_x,min_y,max_x,max_y
    #[arg(long)]
    pub roi: Option<String>,

    /// CRS of --roi (default EPSG:4326)
    #[arg(long)]
    pub roi_crs: Option<String>,

    /// What to do when the ROI misses a band mosaic (abort, unclipped)
    #[arg(long, value_enum)]
    pub roi_miss: Option<RoiMissPolicy>,

    /// Engine working-memory budget in megabytes
    #[arg(long)]
    pub ram: Option<u32>,

    /// Directory receiving one log file per scene
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Publish final products under <ard-dir>/<norad id>/<datetime>/
    #[arg(long)]
    pub ard_dir: Option<PathBuf>,

    /// Radiometric calibration level (toa, toc)
    #[arg(long, value_enum)]
    pub level: Option<CalibrationLevel>,

    /// Calibrated pixel encoding (scaled-u16, float32)
    #[arg(long, value_enum)]
    pub encoding: Option<PixelEncoding>,

    /// Pleiades fusion topology (superimpose, bundle)
    #[arg(long, value_enum)]
    pub fusion: Option<PleiadesFusion>,

    /// Directory holding the otbcli_* executables (default: PATH)
    #[arg(long)]
    pub otb_bin_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue with other scenes when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
