//! Command Line Interface (CLI) layer for ARDPRO.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-scene and batch
//! processing flows. It wires user-provided options to the underlying
//! library functionality exposed via `ardpro::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
