//! Scene identity, working layout and the per-band stage chain shared by
//! every platform: extract, discover, fetch elevation, calibrate, fuse, clip.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::grid::{FusionPlan, plan_fusion};
use crate::core::metadata::extract_datetime;
use crate::core::params::RunConfig;
use crate::core::platform::Platform;
use crate::core::stages::{ElevationSource, Stage, StageRecord, StagedPipeline};
use crate::error::{Error, Result};
use crate::io::{
    ArchiveExtractor, GdalRoiResolver, OtbCliEngine, RasterEngine, RoiResolver, SceneLog,
    UnzipExtractor,
};
use crate::types::{Band, RoiMissPolicy};

/// Per-band tile lists discovered in an extracted scene.
pub type BandImages = BTreeMap<Band, Vec<PathBuf>>;

/// Identity of one scene archive, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    archive: PathBuf,
    platform: Platform,
    platform_code: String,
    norad_id: u32,
    acquired: NaiveDateTime,
}

impl Scene {
    /// Identify the platform family from the archive name, then parse it.
    pub fn open(archive: impl AsRef<Path>) -> Result<Self> {
        let platform = Platform::identify(archive.as_ref())?;
        Self::open_as(archive, platform)
    }

    pub fn open_as(archive: impl AsRef<Path>, platform: Platform) -> Result<Self> {
        let archive = archive.as_ref().to_path_buf();
        let acquired = extract_datetime(&archive).ok_or_else(|| Error::MetadataParse {
            field: "acquisition datetime",
            name: archive.display().to_string(),
        })?;
        let (platform_code, norad_id) = platform.resolve(&archive)?;
        Ok(Self {
            archive,
            platform,
            platform_code,
            norad_id,
            acquired,
        })
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn name(&self) -> String {
        self.archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn platform_code(&self) -> &str {
        &self.platform_code
    }

    pub fn norad_id(&self) -> u32 {
        self.norad_id
    }

    pub fn acquired(&self) -> NaiveDateTime {
        self.acquired
    }

    /// `<norad id>/<YYYYMMDD_HHMMSS>`
    pub fn sub_path(&self) -> PathBuf {
        PathBuf::from(self.norad_id.to_string()).join(self.acquired.format("%Y%m%d_%H%M%S").to_string())
    }

    /// Working tree root: `tmp/` next to the archive.
    pub fn work_dir(&self) -> PathBuf {
        self.archive
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("tmp")
    }
}

/// Directory layout of a scene's working tree; each subtree is a cache namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    root: PathBuf,
}

impl WorkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scene(&self) -> PathBuf {
        self.root.join("scene")
    }

    pub fn cal(&self, band: Band) -> PathBuf {
        self.root.join("cal").join(band.token())
    }

    pub fn mosaic(&self, band: Band) -> PathBuf {
        self.root.join("mosaic").join(band.token())
    }

    pub fn roi(&self, band: Band) -> PathBuf {
        self.root.join("roi").join(band.token())
    }

    pub fn pan(&self) -> PathBuf {
        self.root.join("pan")
    }
}

/// One fused (and optionally clipped) image per band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mosaic {
    pub ms: PathBuf,
    pub pan: PathBuf,
}

impl Mosaic {
    pub fn band(&self, band: Band) -> &Path {
        match band {
            Band::Ms => &self.ms,
            Band::P => &self.pan,
        }
    }
}

/// External collaborators a dataset delegates to.
pub struct Collaborators {
    pub engine: Box<dyn RasterEngine>,
    pub extractor: Box<dyn ArchiveExtractor>,
    pub roi_resolver: Box<dyn RoiResolver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            engine: Box::new(OtbCliEngine::new()),
            extractor: Box::new(UnzipExtractor::default()),
            roi_resolver: Box::new(GdalRoiResolver),
        }
    }
}

/// A scene plus its run configuration, wired to a staged pipeline.
pub struct Dataset {
    scene: Scene,
    config: RunConfig,
    layout: WorkLayout,
    pipeline: StagedPipeline,
    extractor: Box<dyn ArchiveExtractor>,
    roi_resolver: Box<dyn RoiResolver>,
    log_path: PathBuf,
}

impl Dataset {
    /// Open the scene log sink and bind the collaborators. The sink lives as
    /// long as the dataset.
    pub fn new(scene: Scene, config: RunConfig, collaborators: Collaborators) -> Result<Self> {
        let log = SceneLog::open(&config.log_dir, scene.archive())?;
        let log_path = log.path().to_path_buf();
        let layout = WorkLayout::new(scene.work_dir());
        let pipeline = StagedPipeline::new(collaborators.engine, Box::new(log), config.ram_mb);
        info!(
            "{} scene {} ({}, NORAD {}) acquired {}",
            scene.platform(),
            scene.name(),
            scene.platform_code(),
            scene.norad_id(),
            scene.acquired()
        );
        Ok(Self {
            scene,
            config,
            layout,
            pipeline,
            extractor: collaborators.extractor,
            roi_resolver: collaborators.roi_resolver,
            log_path,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn layout(&self) -> &WorkLayout {
        &self.layout
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn lineage(&self) -> &[StageRecord] {
        self.pipeline.lineage()
    }

    /// Elevation inputs, only when both DEM and geoid are configured.
    pub fn elevation(&self) -> Option<ElevationSource> {
        match (&self.config.dem_path, &self.config.geoid_path) {
            (Some(dem), Some(geoid)) => Some(ElevationSource {
                dem: dem.clone(),
                geoid: geoid.clone(),
            }),
            _ => None,
        }
    }

    /// Unpack the archive into `tmp/scene`; a non-zero exit aborts the scene.
    pub fn extract(&mut self) -> Result<PathBuf> {
        let dest = self.layout.scene();
        fs::create_dir_all(&dest)?;
        info!("Extracting {} into {:?}", self.scene.name(), dest);

        let out = self.extractor.extract(self.scene.archive(), &dest)?;
        let mut text = format!("extract {} (exit code {})\n", self.scene.name(), out.code);
        text.push_str(&out.stdout);
        text.push_str(&out.stderr);
        self.pipeline.log_text(&text)?;

        if !out.success() {
            return Err(Error::Archive {
                archive: self.scene.archive().to_path_buf(),
                code: out.code,
                stderr: out.stderr,
            });
        }
        Ok(dest)
    }

    /// Recursively find `IMG_<code>_<band>_*/IMG_<code>_<band>_*.TIF` under `root`.
    pub fn discover_band_images(&self, root: &Path) -> BandImages {
        let mut images = BandImages::new();
        for band in Band::ALL {
            let prefix = format!("IMG_{}_{}_", self.scene.platform_code(), band.token());
            let found: Vec<PathBuf> = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_band_image(p, &prefix))
                .collect();
            debug!("{} band: {} image(s)", band, found.len());
            images.insert(band, found);
        }
        images
    }

    /// Elevation tiles for the panchromatic footprint, when a DEM directory is set.
    /// Without panchromatic images there is no footprint; the band fails later.
    pub fn fetch_elevation_tiles(&mut self, pan_images: &[PathBuf]) -> Result<()> {
        match self.config.dem_path.clone() {
            Some(_) if pan_images.is_empty() => {
                warn!("No {} images, skipping elevation tiles", Band::P);
                Ok(())
            }
            Some(dem) => self.pipeline.fetch_elevation_tiles(pan_images, &dem),
            None => Ok(()),
        }
    }

    pub fn calibrate_band(&mut self, band: Band, images: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let out_dir = self.layout.cal(band);
        images
            .iter()
            .map(|image| {
                let stage = Stage::Calibrate {
                    input: image.clone(),
                    level: self.config.calibration_level,
                    encoding: self.config.encoding,
                };
                self.pipeline.run(&stage, &out_dir)
            })
            .collect()
    }

    /// Validate the tile grid and fuse it; a single tile is its own mosaic.
    pub fn fuse_band(&mut self, band: Band, tiles: &[PathBuf]) -> Result<PathBuf> {
        match plan_fusion(tiles) {
            FusionPlan::Single(tile) => {
                info!("{} band has a single tile, skipping fusion", band);
                Ok(tile)
            }
            FusionPlan::Fuse {
                tiles,
                rows,
                cols,
                output_name,
            } => {
                let stage = Stage::FuseTiles {
                    tiles,
                    rows,
                    cols,
                    output_name,
                };
                self.pipeline.run(&stage, &self.layout.mosaic(band))
            }
            FusionPlan::Incomplete { tiles, rows, cols } => Err(Error::IncompleteTileGrid {
                band,
                tiles,
                rows,
                cols,
            }),
        }
    }

    /// Clip `mosaic` to the configured region of interest, if any.
    pub fn clip_band(&mut self, band: Band, mosaic: PathBuf) -> Result<PathBuf> {
        let Some(roi) = self.config.roi.as_ref() else {
            return Ok(mosaic);
        };
        match self.roi_resolver.resolve(roi, &mosaic)? {
            Some(extent) => {
                let stage = Stage::ClipToRoi {
                    input: mosaic,
                    extent,
                };
                self.pipeline.run(&stage, &self.layout.roi(band))
            }
            None => match self.config.roi_miss {
                RoiMissPolicy::Abort => Err(Error::RoiMiss {
                    band,
                    image: mosaic,
                }),
                RoiMissPolicy::Unclipped => {
                    warn!("ROI misses {} mosaic {:?}, keeping it unclipped", band, mosaic);
                    Ok(mosaic)
                }
            },
        }
    }

    /// Shared prelude of every topology: extract, discover, fetch elevation,
    /// then calibrate, fuse and clip each band.
    pub fn build_mosaics(&mut self) -> Result<Mosaic> {
        let scene_dir = self.extract()?;
        let images = self.discover_band_images(&scene_dir);
        let no_images = Vec::new();
        let band_images = |band: Band| images.get(&band).unwrap_or(&no_images);

        self.fetch_elevation_tiles(band_images(Band::P))?;

        let ms = self.build_band(Band::Ms, band_images(Band::Ms))?;
        let pan = self.build_band(Band::P, band_images(Band::P))?;
        Ok(Mosaic { ms, pan })
    }

    fn build_band(&mut self, band: Band, images: &[PathBuf]) -> Result<PathBuf> {
        let calibrated = self.calibrate_band(band, images)?;
        let mosaic = self.fuse_band(band, &calibrated)?;
        self.clip_band(band, mosaic)
    }

    /// Resample the MS mosaic onto the PAN grid.
    pub fn superimpose(&mut self, mosaic: &Mosaic) -> Result<PathBuf> {
        let stage = Stage::Superimpose {
            pan: mosaic.pan.clone(),
            ms: mosaic.ms.clone(),
            elevation: self.elevation(),
        };
        self.pipeline.run(&stage, &self.layout.pan())
    }

    /// Fuse `pan` with an MS image already sharing or registrable to its grid.
    pub fn pansharpen(&mut self, pan: &Path, ms: &Path) -> Result<PathBuf> {
        let stage = Stage::Pansharpen {
            pan: pan.to_path_buf(),
            ms: ms.to_path_buf(),
            method: self.config.pan_method,
        };
        self.pipeline.run(&stage, &self.layout.pan())
    }

    /// One-shot bundle-to-perfect-sensor fusion of the mosaic pair.
    pub fn bundle_to_sensor(&mut self, mosaic: &Mosaic) -> Result<PathBuf> {
        let stage = Stage::BundleToSensor {
            pan: mosaic.pan.clone(),
            ms: mosaic.ms.clone(),
            elevation: self.elevation(),
            method: self.config.pan_method,
        };
        self.pipeline.run(&stage, &self.layout.pan())
    }

    /// Copy `product` to `<ard_dir>/<norad>/<datetime>/` when publishing is configured.
    pub fn publish(&self, product: &Path) -> Result<Option<PathBuf>> {
        let Some(ard_dir) = self.config.ard_dir.as_ref() else {
            return Ok(None);
        };
        let dest_dir = ard_dir.join(self.scene.sub_path());
        let name = product.file_name().ok_or_else(|| Error::InvalidArgument {
            arg: "product",
            value: product.display().to_string(),
        })?;
        let dest = dest_dir.join(name);
        if dest.exists() {
            info!("Already published: {:?}", dest);
            return Ok(Some(dest));
        }

        fs::create_dir_all(&dest_dir)?;
        let mut staged = tempfile::Builder::new()
            .prefix(".publish-")
            .tempfile_in(&dest_dir)?;
        let mut src = fs::File::open(product)?;
        std::io::copy(&mut src, staged.as_file_mut())?;
        staged.persist(&dest).map_err(|e| Error::Io(e.error))?;
        info!("Published {:?}", dest);
        Ok(Some(dest))
    }
}

fn is_band_image(path: &Path, prefix: &str) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".TIF"));
    let parent_ok = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix));
    name_ok && parent_ok
}
