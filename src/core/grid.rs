//! Tile grid completeness check run before fusing tiles into a mosaic.
use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::metadata::{extract_tile_coordinate, replace_tile_token};

/// Marker replacing the `R1C1` token in fused mosaic filenames.
pub const MOSAIC_MARKER: &str = "MOSAIC";

/// Outcome of validating one band's tile set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FusionPlan {
    /// A single tile is its own mosaic; no fusion happens.
    Single(PathBuf),
    /// Tiles fill a rows x cols grid exactly.
    Fuse {
        /// Lexicographically sorted tile paths
        tiles: Vec<PathBuf>,
        rows: u32,
        cols: u32,
        /// Basename of the mosaic, derived from the first sorted tile
        output_name: String,
    },
    /// Gaps, duplicates, extras or unparseable tiles.
    Incomplete { tiles: usize, rows: u32, cols: u32 },
}

/// Decide whether `tiles` can be fused.
///
/// The grid extent is the maximum row and column seen. Fusion proceeds only
/// when every tile has a distinct coordinate and the count equals
/// `rows * cols`.
pub fn plan_fusion(tiles: &[PathBuf]) -> FusionPlan {
    match tiles {
        [] => {
            return FusionPlan::Incomplete {
                tiles: 0,
                rows: 0,
                cols: 0,
            };
        }
        [single] => return FusionPlan::Single(single.clone()),
        _ => {}
    }

    let mut rows = 0;
    let mut cols = 0;
    let mut seen = HashSet::with_capacity(tiles.len());
    let mut parsed_all = true;
    for tile in tiles {
        match extract_tile_coordinate(tile) {
            Some(coord) => {
                rows = rows.max(coord.row);
                cols = cols.max(coord.col);
                seen.insert(coord);
            }
            None => parsed_all = false,
        }
    }

    let incomplete = FusionPlan::Incomplete {
        tiles: tiles.len(),
        rows,
        cols,
    };
    let area = rows as usize * cols as usize;
    if !parsed_all || seen.len() != tiles.len() || tiles.len() != area {
        return incomplete;
    }

    let mut sorted = tiles.to_vec();
    sorted.sort();
    let output_name = sorted[0]
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|name| replace_tile_token(name, MOSAIC_MARKER));

    match output_name {
        Some(output_name) => FusionPlan::Fuse {
            tiles: sorted,
            rows,
            cols,
            output_name,
        },
        None => incomplete,
    }
}
