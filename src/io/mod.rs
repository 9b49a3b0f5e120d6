//! I/O layer: the external collaborators a scene run talks to.
//! Provides the raster-processing `engine`, the archive `extract`or, the
//! GDAL-backed region-of-interest resolver in `roi`, and the per-scene `log` sink.
pub mod engine;
pub use engine::{AppInvocation, EngineError, OtbCliEngine, ParamValue, PixelType, RasterEngine};

pub mod extract;
pub use extract::{ArchiveExtractor, ExtractOutput, UnzipExtractor};

pub mod roi;
pub use roi::{BoundingBox, GdalRoiResolver, ImageExtent, RoiResolver};

pub mod log;
pub use log::SceneLog;
