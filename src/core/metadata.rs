//! Filename metadata: acquisition datetime, platform code and tile grid position.
//!
//! All functions look at the basename only and return `None` when the
//! expected token is absent. Callers decide whether absence is fatal.
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// 14 ASCII date/time digits followed by 1..=6 fractional second digits
static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([0-9]{14})([0-9]{1,6})_").expect("timestamp pattern"));

static TILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_R([0-9]+)C([0-9]+)(?:[^0-9]|$)").expect("tile pattern"));

/// Row/column position of a tile inside its scene grid. Both are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoordinate {
    pub row: u32,
    pub col: u32,
}

fn basename(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Acquisition datetime from an underscore-delimited timestamp token, e.g.
/// `_201401011030252_` → 2014-01-01 10:30:25.200.
pub fn extract_datetime(path: impl AsRef<Path>) -> Option<NaiveDateTime> {
    let name = basename(path.as_ref())?;
    let caps = TIMESTAMP.captures(name)?;
    let digits = &caps[1];
    let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();

    let year = digits[0..4].parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?;

    // Fraction digits are tenths, hundredths, ... so pad on the right.
    let micros = format!("{:0<6}", &caps[2]).parse::<u32>().ok()?;
    date.and_hms_micro_opt(field(8..10)?, field(10..12)?, field(12..14)?, micros)
}

/// Platform token matched by `pattern`, with its delimiting underscores removed.
pub fn extract_platform_code(path: impl AsRef<Path>, pattern: &Regex) -> Option<String> {
    let name = basename(path.as_ref())?;
    let code = pattern.find(name)?.as_str().trim_matches('_');
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// Grid position of a single-band raster tile (`..._R2C1.TIF`).
pub fn extract_tile_coordinate(path: impl AsRef<Path>) -> Option<TileCoordinate> {
    let path = path.as_ref();
    let is_tif = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif"));
    if !is_tif {
        return None;
    }

    let caps = TILE.captures(basename(path)?)?;
    let row = caps[1].parse::<u32>().ok()?;
    let col = caps[2].parse::<u32>().ok()?;
    if row == 0 || col == 0 {
        return None;
    }
    Some(TileCoordinate { row, col })
}

/// Replace the `_R<r>C<c>` token of a tile basename with `_<marker>`.
pub(crate) fn replace_tile_token(name: &str, marker: &str) -> Option<String> {
    let caps = TILE.captures(name)?;
    let whole = caps.get(0)?;
    let token_end = caps.get(2)?.end();
    let mut out = String::with_capacity(name.len() + marker.len());
    out.push_str(&name[..whole.start()]);
    out.push('_');
    out.push_str(marker);
    out.push_str(&name[token_end..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn datetime_from_real_pleiades_name() {
        let dt = extract_datetime("/data/DS_PHR1A_201401011030252_FR1_PX_E010N45_0101_01234.zip")
            .unwrap();
        assert_eq!(dt.format("%Y%m%d_%H%M%S").to_string(), "20140101_103025");
        assert_eq!(dt.nanosecond(), 200_000_000);
    }

    #[test]
    fn datetime_ignores_surrounding_noise() {
        let a = extract_datetime("x_202001011230451_y.zip").unwrap();
        let b = extract_datetime("IMG_SPOT6_MS_202001011230451_ORT_123_R1C1.TIF").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn datetime_keeps_millisecond_fraction() {
        let dt = extract_datetime("DS_PHR1A_20200101123045123_scene.zip").unwrap();
        assert_eq!(dt.second(), 45);
        assert_eq!(dt.nanosecond(), 123_000_000);
    }

    #[test]
    fn datetime_absent_without_token() {
        assert!(extract_datetime("DS_PHR1A_2020010112_scene.zip").is_none());
        assert!(extract_datetime("no_timestamp_here.zip").is_none());
        // 13th month
        assert!(extract_datetime("a_202013011230451_b").is_none());
    }

    #[test]
    fn non_ascii_digits_are_not_timestamp_digits() {
        // U+0660 ARABIC-INDIC DIGIT ZERO is two bytes wide
        assert!(extract_datetime("DS_PHR1A_123\u{0660}56789012345_x.zip").is_none());
        assert!(extract_datetime("DS_PHR1A_2020010112304\u{0665}123_x.zip").is_none());
        assert!(extract_tile_coordinate("IMG_PHR1A_P_001_R\u{0661}C1.TIF").is_none());
    }

    #[test]
    fn platform_code_is_stripped() {
        let re = Regex::new(r"_SPOT\d_").unwrap();
        assert_eq!(
            extract_platform_code("DS_SPOT7_202001011230451_x.zip", &re).as_deref(),
            Some("SPOT7")
        );
        assert!(extract_platform_code("DS_PHR1A_202001011230451_x.zip", &re).is_none());
    }

    #[test]
    fn tile_coordinate_requires_tif() {
        assert_eq!(
            extract_tile_coordinate("a/IMG_PHR1A_P_001_R2C3.TIF"),
            Some(TileCoordinate { row: 2, col: 3 })
        );
        assert_eq!(
            extract_tile_coordinate("IMG_PHR1A_P_001_R1C1.tif"),
            Some(TileCoordinate { row: 1, col: 1 })
        );
        assert!(extract_tile_coordinate("IMG_PHR1A_P_001_R1C1.JP2").is_none());
        assert!(extract_tile_coordinate("IMG_PHR1A_P_001.TIF").is_none());
        assert!(extract_tile_coordinate("IMG_PHR1A_P_001_R0C1.TIF").is_none());
    }

    #[test]
    fn tile_token_replacement_keeps_suffix() {
        assert_eq!(
            replace_tile_token("IMG_PHR1A_MS_001_R1C1_CAL.TIF", "MOSAIC").as_deref(),
            Some("IMG_PHR1A_MS_001_MOSAIC_CAL.TIF")
        );
        assert!(replace_tile_token("IMG_PHR1A_MS_001.TIF", "MOSAIC").is_none());
    }
}
