//! Closed set of supported platform families and their orbital-identity tables.
//!
//! The NORAD id is only used to namespace cached products per platform; no
//! orbit is ever propagated from it.
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metadata::extract_platform_code;
use crate::error::{Error, Result};

static PLEIADES_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_PHR[0-9][AB]_").expect("pleiades code pattern"));
static SPOT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_SPOT[0-9]_").expect("spot code pattern"));

const PLEIADES_NORAD: &[(&str, u32)] = &[("PHR1A", 38012), ("PHR1B", 39019)];
const SPOT_NORAD: &[(&str, u32)] = &[("SPOT5", 27421), ("SPOT6", 38755), ("SPOT7", 40053)];

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Platform {
    Pleiades,
    Spot,
}

impl Platform {
    /// Family detection from the archive basename: `PHR` first, then `SPOT`.
    pub fn identify(path: impl AsRef<Path>) -> Result<Platform> {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.contains("PHR") {
            Ok(Platform::Pleiades)
        } else if name.contains("SPOT") {
            Ok(Platform::Spot)
        } else {
            Err(Error::UnsupportedScene { name })
        }
    }

    /// Pattern locating the platform code token inside a filename.
    pub fn code_pattern(self) -> &'static Regex {
        match self {
            Platform::Pleiades => &PLEIADES_CODE,
            Platform::Spot => &SPOT_CODE,
        }
    }

    /// Platform code → NORAD catalogue number for this family.
    pub fn registry(self) -> &'static [(&'static str, u32)] {
        match self {
            Platform::Pleiades => PLEIADES_NORAD,
            Platform::Spot => SPOT_NORAD,
        }
    }

    pub fn norad_id(self, code: &str) -> Option<u32> {
        self.registry()
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, id)| *id)
    }

    /// Extract the platform code from `path` and look up its orbital identity.
    pub fn resolve(self, path: impl AsRef<Path>) -> Result<(String, u32)> {
        let path = path.as_ref();
        let code = extract_platform_code(path, self.code_pattern()).ok_or_else(|| {
            Error::MetadataParse {
                field: "platform code",
                name: path.display().to_string(),
            }
        })?;
        match self.norad_id(&code) {
            Some(id) => Ok((code, id)),
            None => Err(Error::UnknownPlatform { code }),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Pleiades => write!(f, "Pleiades"),
            Platform::Spot => write!(f, "SPOT"),
        }
    }
}
