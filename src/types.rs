//! Shared types and enums used across ARDPRO.
//! Includes the sensor `Band` set, pansharpening `PanMethod`, calibration
//! `CalibrationLevel` and `PixelEncoding`, and the run policies
//! `RoiMissPolicy` and `PleiadesFusion`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sensor bands delivered in every Pleiades/SPOT archive.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Band {
    /// Multispectral
    Ms,
    /// Panchromatic
    P,
}

impl Band {
    /// Dual-sensor convention: every scene carries exactly these two bands.
    pub const ALL: [Band; 2] = [Band::Ms, Band::P];

    /// Token used in product filenames and working directory names.
    pub fn token(self) -> &'static str {
        match self {
            Band::Ms => "MS",
            Band::P => "P",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanMethod {
    Rcs,
    Lmvm,
    Bayes,
}

impl PanMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PanMethod::Rcs => "rcs",
            PanMethod::Lmvm => "lmvm",
            PanMethod::Bayes => "bayes",
        }
    }
}

impl std::fmt::Display for PanMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationLevel {
    /// Top of atmosphere reflectance
    #[default]
    Toa,
    /// Top of canopy reflectance
    Toc,
}

impl CalibrationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationLevel::Toa => "toa",
            CalibrationLevel::Toc => "toc",
        }
    }
}

/// Pixel encoding of calibrated reflectance.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PixelEncoding {
    /// Reflectance scaled to 0..1000 and stored as uint16
    #[default]
    ScaledU16,
    /// Reflectance 0..1.0 stored as float32
    Float32,
}

/// What to do when the region of interest does not overlap a mosaic.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RoiMissPolicy {
    /// Fail the scene with `Error::RoiMiss`
    #[default]
    Abort,
    /// Keep the unclipped mosaic for that band and carry on
    Unclipped,
}

impl std::fmt::Display for RoiMissPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoiMissPolicy::Abort => write!(f, "Abort"),
            RoiMissPolicy::Unclipped => write!(f, "Unclipped"),
        }
    }
}

/// Sensor fusion path used by Pleiades scenes.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PleiadesFusion {
    /// Superimpose MS onto the PAN grid, then pansharpen
    #[default]
    Superimpose,
    /// Single bundle-to-perfect-sensor stage
    Bundle,
}
