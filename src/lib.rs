#![doc = r#"
ARDPRO — Pleiades and SPOT scene archives to Analysis-Ready-Data.

This crate orchestrates the raster-processing chain that turns a delivered
Pleiades or SPOT scene archive into a pansharpened ARD product: archive
extraction, radiometric calibration, tile fusion, optional region-of-interest
clipping and platform-specific sensor fusion. The heavy lifting is done by an
external raster engine (Orfeo ToolBox command-line applications by default);
this crate decides which stage runs, in which order, for which platform, and
caches every intermediate product on disk so interrupted runs resume cheaply.

Stability
---------
The public library API is experimental in initial releases and may evolve.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Orfeo ToolBox `otbcli_*` applications and `unzip` on `PATH` (or a custom
  raster engine / extractor, see [`core::dataset::Collaborators`]).
- Rust 2024 edition toolchain.

Quick start: process one scene
------------------------------
```rust,no_run
use std::path::{Path, PathBuf};
use ardpro::{process_scene, PanMethod, RunConfig};

fn main() -> ardpro::Result<()> {
    let config = RunConfig {
        dem_path: Some(PathBuf::from("/data/srtm")),
        geoid_path: Some(PathBuf::from("/data/egm96.grd")),
        pan_method: Some(PanMethod::Bayes),
        ard_dir: Some(PathBuf::from("/data/ard")),
        ..RunConfig::default()
    };

    let product = process_scene(
        Path::new("/data/incoming/DS_PHR1A_202001011230451_FR1_PX_E001N43.zip"),
        &config,
    )?;
    println!("pansharpened: {:?}", product.pansharpened);
    Ok(())
}
```

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use ardpro::{process_directory, RunConfig};

fn main() -> ardpro::Result<()> {
    let report = process_directory(
        Path::new("/data/incoming"),
        &RunConfig::default(),
        true, // continue_on_error
    )?;

    println!("processed={} skipped={} errors={}", report.processed, report.skipped, report.errors);
    Ok(())
}
```

Error handling
--------------
All public functions return `ardpro::Result<T>`; match on `ardpro::Error` to handle
specific cases, e.g. an incomplete tile grid or a failing engine application.

```rust,no_run
use std::path::Path;
use ardpro::{process_scene, Error, RunConfig};

fn main() {
    match process_scene(Path::new("/data/DS_SPOT6_202001011230451_x.zip"), &RunConfig::default()) {
        Ok(product) => println!("{:?}", product.pansharpened),
        Err(Error::IncompleteTileGrid { band, tiles, rows, cols }) => {
            eprintln!("{band}: {tiles} tile(s) for a {rows}x{cols} grid")
        }
        Err(Error::Engine(e)) => eprintln!("Engine error: {e}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — filename metadata, platform registry, tile grids, cached stages and topologies.
- [`types`] — bands and run-policy enums.
- [`io`] — raster engine, archive extractor, ROI resolver and scene log.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::dataset::{Collaborators, Dataset, Mosaic, Scene};
pub use core::params::RunConfig;
pub use core::platform::Platform;
pub use core::profile::{ArdProduct, PlatformProfile};
pub use core::stages::{Stage, StageKind, StageRecord, StagedPipeline};
pub use error::{Error, Result};
pub use types::{Band, CalibrationLevel, PanMethod, PixelEncoding, PleiadesFusion, RoiMissPolicy};

// High-level API re-exports
pub use api::{
    BatchReport, iterate_scene_dirs, process_directory, process_directory_with, process_scene,
    process_scene_with, scene_archive_in,
};
