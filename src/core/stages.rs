//! Idempotent processing stages.
//!
//! Every stage maps its inputs to a deterministic output path. A file at that
//! path is a cache hit and the engine is not invoked. Fresh outputs are
//! produced inside a hidden staging directory next to the final path and
//! renamed into place only after the engine succeeds, so an interrupted run
//! never leaves a truncated file behind that would later pass as a cache hit.
//! Sidecar files the engine writes next to the product are moved along with
//! it; the product is renamed last.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::{AppInvocation, EngineError, ImageExtent, PixelType, RasterEngine};
use crate::types::{CalibrationLevel, PanMethod, PixelEncoding};

/// Creation options for intermediate products.
const TILED: &str = "?&gdal:co:TILED=YES";
/// Creation options for the final pansharpened product.
const TILED_DEFLATE_BIGTIFF: &str =
    "?&gdal:co:TILED=YES&gdal:co:COMPRESS=DEFLATE&gdal:co:BIGTIFF=YES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Calibrate,
    FuseTiles,
    ClipToRoi,
    BundleToSensor,
    Superimpose,
    Pansharpen,
    FetchElevationTiles,
}

impl StageKind {
    /// Engine application implementing the stage.
    pub fn app(self) -> &'static str {
        match self {
            StageKind::Calibrate => "OpticalCalibration",
            StageKind::FuseTiles => "TileFusion",
            StageKind::ClipToRoi => "ExtractROI",
            StageKind::BundleToSensor => "BundleToPerfectSensor",
            StageKind::Superimpose => "Superimpose",
            StageKind::Pansharpen => "Pansharpening",
            StageKind::FetchElevationTiles => "DownloadSRTMTiles",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// DEM directory plus geoid grid used for orthorectifying resampling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationSource {
    pub dem: PathBuf,
    pub geoid: PathBuf,
}

/// A cached stage request: inputs and transformation parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Calibrate {
        input: PathBuf,
        level: CalibrationLevel,
        encoding: PixelEncoding,
    },
    FuseTiles {
        tiles: Vec<PathBuf>,
        rows: u32,
        cols: u32,
        output_name: String,
    },
    ClipToRoi {
        input: PathBuf,
        extent: ImageExtent,
    },
    BundleToSensor {
        pan: PathBuf,
        ms: PathBuf,
        elevation: Option<ElevationSource>,
        method: Option<PanMethod>,
    },
    Superimpose {
        pan: PathBuf,
        ms: PathBuf,
        elevation: Option<ElevationSource>,
    },
    Pansharpen {
        pan: PathBuf,
        ms: PathBuf,
        method: Option<PanMethod>,
    },
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidArgument {
            arg: "stage input",
            value: path.display().to_string(),
        })
}

/// `a.TIF` + `_CAL` → `a_CAL.TIF`
fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}{suffix}.{ext}"),
        None => format!("{name}{suffix}"),
    }
}

/// Replace the first of `tokens` found in `name`, or tag the stem with `fallback`.
fn substitute(name: &str, tokens: &[&str], to: &str, fallback: &str) -> String {
    tokens
        .iter()
        .find(|t| name.contains(**t))
        .map(|t| name.replacen(*t, to, 1))
        .unwrap_or_else(|| with_suffix(name, fallback))
}

/// Move everything the engine left in `staging` next to `output`, the product
/// last. Sidecars such as `.geom` sensor models must travel with the image.
fn promote(staging: &Path, product: &Path, output: &Path) -> Result<()> {
    let out_dir = output.parent().unwrap_or_else(|| Path::new("."));
    for entry in fs::read_dir(staging)? {
        let path = entry?.path();
        if path == product {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::rename(&path, out_dir.join(name))?;
        }
    }
    fs::rename(product, output)?;
    Ok(())
}

fn with_elevation(inv: AppInvocation, elevation: &Option<ElevationSource>) -> AppInvocation {
    match elevation {
        Some(e) => inv.path("elev.dem", &e.dem).path("elev.geoid", &e.geoid),
        None => inv,
    }
}

fn with_method(inv: AppInvocation, method: Option<PanMethod>) -> AppInvocation {
    match method {
        Some(m) => inv.string("method", m.as_str()),
        None => inv,
    }
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Calibrate { .. } => StageKind::Calibrate,
            Stage::FuseTiles { .. } => StageKind::FuseTiles,
            Stage::ClipToRoi { .. } => StageKind::ClipToRoi,
            Stage::BundleToSensor { .. } => StageKind::BundleToSensor,
            Stage::Superimpose { .. } => StageKind::Superimpose,
            Stage::Pansharpen { .. } => StageKind::Pansharpen,
        }
    }

    /// Deterministic basename of the stage product.
    pub fn output_name(&self) -> Result<String> {
        Ok(match self {
            Stage::Calibrate { input, .. } => with_suffix(file_name(input)?, "_CAL"),
            Stage::FuseTiles { output_name, .. } => output_name.clone(),
            Stage::ClipToRoi { input, .. } => with_suffix(file_name(input)?, "_ROI"),
            Stage::BundleToSensor { ms, .. } => {
                substitute(file_name(ms)?, &["_MS_"], "_PAN_", "_PAN")
            }
            Stage::Superimpose { ms, .. } => {
                substitute(file_name(ms)?, &["_MS_"], "_MS_SUPER_", "_SUPER")
            }
            Stage::Pansharpen { ms, .. } => {
                substitute(file_name(ms)?, &["_MS_SUPER_", "_MS_"], "_PAN_", "_PAN")
            }
        })
    }

    /// Engine call writing the product to `output`.
    pub fn invocation(&self, output: &Path, ram_mb: u32) -> AppInvocation {
        let inv = AppInvocation::new(self.kind().app(), ram_mb);
        match self {
            Stage::Calibrate {
                input,
                level,
                encoding,
            } => {
                let (milli, pixel_type) = match encoding {
                    PixelEncoding::ScaledU16 => (true, PixelType::Uint16),
                    PixelEncoding::Float32 => (false, PixelType::Float32),
                };
                inv.path("in", input)
                    .string("level", level.as_str())
                    .flag("milli", milli)
                    .output("out", output, TILED, Some(pixel_type))
            }
            Stage::FuseTiles {
                tiles, rows, cols, ..
            } => inv
                .paths("il", tiles)
                .int("cols", i64::from(*cols))
                .int("rows", i64::from(*rows))
                .output("out", output, TILED, None),
            Stage::ClipToRoi { input, extent } => inv
                .path("in", input)
                .string("mode", "extent")
                .string("mode.extent.unit", "phy")
                .float("mode.extent.ulx", extent.ulx)
                .float("mode.extent.uly", extent.uly)
                .float("mode.extent.lrx", extent.lrx)
                .float("mode.extent.lry", extent.lry)
                .output("out", output, TILED, None),
            Stage::BundleToSensor {
                pan,
                ms,
                elevation,
                method,
            } => {
                let inv = inv.path("inp", pan).path("inxs", ms);
                let inv = with_method(with_elevation(inv, elevation), *method);
                inv.output("out", output, TILED_DEFLATE_BIGTIFF, None)
            }
            Stage::Superimpose { pan, ms, elevation } => {
                let inv = inv.path("inr", pan).path("inm", ms);
                with_elevation(inv, elevation).output("out", output, TILED, None)
            }
            Stage::Pansharpen { pan, ms, method } => {
                let inv = inv.path("inp", pan).path("inxs", ms);
                with_method(inv, *method).output("out", output, TILED_DEFLATE_BIGTIFF, None)
            }
        }
    }
}

/// One entry of a run's stage history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub kind: StageKind,
    pub output: PathBuf,
    /// True when the output already existed and the engine was skipped
    pub cached: bool,
}

/// Runs stages against an engine, writing all engine diagnostics to the
/// scene sink and keeping the ordered stage history.
pub struct StagedPipeline {
    engine: Box<dyn RasterEngine>,
    sink: Box<dyn Write>,
    ram_mb: u32,
    lineage: Vec<StageRecord>,
}

impl StagedPipeline {
    pub fn new(engine: Box<dyn RasterEngine>, sink: Box<dyn Write>, ram_mb: u32) -> Self {
        Self {
            engine,
            sink,
            ram_mb,
            lineage: Vec::new(),
        }
    }

    /// Return the cached product of `stage` in `out_dir`, producing it first if absent.
    pub fn run(&mut self, stage: &Stage, out_dir: &Path) -> Result<PathBuf> {
        let kind = stage.kind();
        let name = stage.output_name()?;
        let output = out_dir.join(&name);

        if output.exists() {
            info!("{}: reusing {:?}", kind, output);
            self.record(kind, &output, true);
            return Ok(output);
        }

        fs::create_dir_all(out_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(out_dir)?;
        let partial = staging.path().join(&name);

        info!("{}: producing {:?}", kind, output);
        let invocation = stage.invocation(&partial, self.ram_mb);
        self.invoke(&invocation)?;

        if !partial.exists() {
            return Err(EngineError::MissingOutput {
                app: invocation.app,
                path: partial,
            }
            .into());
        }
        promote(staging.path(), &partial, &output)?;
        self.record(kind, &output, false);
        Ok(output)
    }

    /// Ask the engine for elevation tiles covering `images`. Not cached by
    /// path: the tile service itself skips tiles already present.
    pub fn fetch_elevation_tiles(&mut self, images: &[PathBuf], tile_dir: &Path) -> Result<()> {
        let kind = StageKind::FetchElevationTiles;
        fs::create_dir_all(tile_dir)?;
        info!("{}: {} image(s) into {:?}", kind, images.len(), tile_dir);
        let invocation = AppInvocation::new(kind.app(), self.ram_mb)
            .paths("il", images)
            .path("tiledir", tile_dir);
        self.invoke(&invocation)?;
        self.record(kind, tile_dir, false);
        Ok(())
    }

    /// Append free-form text to the scene sink.
    pub fn log_text(&mut self, text: &str) -> Result<()> {
        self.sink.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.sink.write_all(b"\n")?;
        }
        self.sink.flush()?;
        Ok(())
    }

    pub fn lineage(&self) -> &[StageRecord] {
        &self.lineage
    }

    fn invoke(&mut self, invocation: &AppInvocation) -> Result<()> {
        debug!("{} {:?}", invocation.app, invocation.to_cli_args());
        writeln!(
            self.sink,
            "[{}] {} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            invocation.app,
            invocation.to_cli_args().join(" ")
        )?;
        let result = self.engine.execute(invocation, &mut *self.sink);
        // flush on every exit path so nothing is left buffered after a failure
        let flushed = self.sink.flush();
        result?;
        flushed?;
        Ok(())
    }

    fn record(&mut self, kind: StageKind, output: &Path, cached: bool) {
        self.lineage.push(StageRecord {
            kind,
            output: output.to_path_buf(),
            cached,
        });
    }
}
