//! Platform stage topologies.
//!
//! Both platforms share the per-band prelude of [`Dataset::build_mosaics`] and
//! diverge at the input of the final fusion stage: Pleiades pansharpens a
//! superimposed MS image (or fuses both mosaics in one bundle stage), SPOT
//! pansharpens the fused MS mosaic directly.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::dataset::{Collaborators, Dataset, Mosaic, Scene};
use crate::core::params::RunConfig;
use crate::core::platform::Platform;
use crate::core::stages::StageRecord;
use crate::error::Result;
use crate::types::PleiadesFusion;

/// Final artifacts of one scene run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArdProduct {
    /// Final fused product
    pub pansharpened: PathBuf,
    /// Reference multispectral mosaic (fused, clipped when an ROI is set)
    pub ms_mosaic: PathBuf,
    pub pan_mosaic: PathBuf,
    /// MS resampled onto the PAN grid (Pleiades superimpose topology only)
    pub superimposed: Option<PathBuf>,
    /// Copy under the ARD root, when publishing is configured
    pub published: Option<PathBuf>,
    pub lineage: Vec<StageRecord>,
}

/// Artifacts produced by a topology, before publishing.
struct Fused {
    pansharpened: PathBuf,
    superimposed: Option<PathBuf>,
}

/// A scene bound to its platform's stage topology.
pub struct PlatformProfile {
    dataset: Dataset,
}

impl PlatformProfile {
    /// Identify the platform from the archive name and bind its topology.
    pub fn new(
        archive: impl AsRef<Path>,
        config: RunConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let scene = Scene::open(archive)?;
        Ok(Self {
            dataset: Dataset::new(scene, config, collaborators)?,
        })
    }

    /// Force a platform family instead of identifying it from the name.
    pub fn with_platform(
        archive: impl AsRef<Path>,
        platform: Platform,
        config: RunConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let scene = Scene::open_as(archive, platform)?;
        Ok(Self {
            dataset: Dataset::new(scene, config, collaborators)?,
        })
    }

    pub fn platform(&self) -> Platform {
        self.dataset.scene().platform()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run the whole scene to its pansharpened product.
    pub fn process_to_ard(&mut self) -> Result<ArdProduct> {
        let mosaic = self.dataset.build_mosaics()?;
        let fused = match self.platform() {
            Platform::Pleiades => pleiades_topology(&mut self.dataset, &mosaic)?,
            Platform::Spot => spot_topology(&mut self.dataset, &mosaic)?,
        };
        let published = self.dataset.publish(&fused.pansharpened)?;
        info!(
            "{} ARD product ready: {:?}",
            self.dataset.scene().name(),
            fused.pansharpened
        );
        Ok(ArdProduct {
            pansharpened: fused.pansharpened,
            ms_mosaic: mosaic.ms,
            pan_mosaic: mosaic.pan,
            superimposed: fused.superimposed,
            published,
            lineage: self.dataset.lineage().to_vec(),
        })
    }
}

/// Superimpose MS onto the PAN grid, then pansharpen from the superimposed
/// image. The bundle variant does both in a single stage.
fn pleiades_topology(dataset: &mut Dataset, mosaic: &Mosaic) -> Result<Fused> {
    match dataset.config().pleiades_fusion {
        PleiadesFusion::Superimpose => {
            let superimposed = dataset.superimpose(mosaic)?;
            let pansharpened = dataset.pansharpen(&mosaic.pan, &superimposed)?;
            Ok(Fused {
                pansharpened,
                superimposed: Some(superimposed),
            })
        }
        PleiadesFusion::Bundle => Ok(Fused {
            pansharpened: dataset.bundle_to_sensor(mosaic)?,
            superimposed: None,
        }),
    }
}

/// Pansharpen straight from the fused mosaics.
fn spot_topology(dataset: &mut Dataset, mosaic: &Mosaic) -> Result<Fused> {
    Ok(Fused {
        pansharpened: dataset.pansharpen(&mosaic.pan, &mosaic.ms)?,
        superimposed: None,
    })
}
