//! Core orchestration: filename metadata, platform identity, tile-grid
//! validation, cached stages, the per-scene dataset and the platform stage
//! topologies built on top of it.
pub mod dataset;
pub mod grid;
pub mod metadata;
pub mod params;
pub mod platform;
pub mod profile;
pub mod stages;
