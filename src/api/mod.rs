//! High-level, ergonomic library API: run one scene archive to ARD, or a
//! directory of scene folders in batch. Prefer these entrypoints over the
//! lower-level `core` building blocks when integrating ARDPRO.
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::core::dataset::Collaborators;
use crate::core::params::RunConfig;
use crate::core::platform::Platform;
use crate::core::profile::{ArdProduct, PlatformProfile};
use crate::error::{Error, Result};

/// Process one scene archive with the default external collaborators
/// (OTB command-line applications, `unzip`, GDAL).
pub fn process_scene(archive: &Path, config: &RunConfig) -> Result<ArdProduct> {
    process_scene_with(archive, config, Collaborators::default())
}

/// Process one scene archive with caller-provided collaborators.
pub fn process_scene_with(
    archive: &Path,
    config: &RunConfig,
    collaborators: Collaborators,
) -> Result<ArdProduct> {
    let mut profile = PlatformProfile::new(archive, config.clone(), collaborators)?;
    profile.process_to_ard()
}

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub products: Vec<ArdProduct>,
}

/// Return an iterator over immediate subdirectories of `input_dir` (candidate scene folders), sorted
pub fn iterate_scene_dirs(input_dir: &Path) -> Result<std::vec::IntoIter<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs.into_iter())
}

/// The single platform-identifiable `.zip` archive in `dir`, if there is exactly one.
pub fn scene_archive_in(dir: &Path) -> Result<Option<PathBuf>> {
    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if path.is_file() && is_zip && Platform::identify(&path).is_ok() {
            archives.push(path);
        }
    }
    match archives.len() {
        1 => Ok(archives.pop()),
        0 => Ok(None),
        n => {
            warn!("{:?} holds {} scene archives, expected one", dir, n);
            Ok(None)
        }
    }
}

/// Process every scene folder under `input_dir` with the default collaborators.
/// If `continue_on_error` is true, errors are counted in the report and processing continues; otherwise, the first error is returned.
pub fn process_directory(
    input_dir: &Path,
    config: &RunConfig,
    continue_on_error: bool,
) -> Result<BatchReport> {
    process_directory_with(input_dir, config, continue_on_error, Collaborators::default)
}

/// Batch variant taking a factory producing fresh collaborators per scene.
pub fn process_directory_with<F>(
    input_dir: &Path,
    config: &RunConfig,
    continue_on_error: bool,
    mut collaborators: F,
) -> Result<BatchReport>
where
    F: FnMut() -> Collaborators,
{
    if !input_dir.is_dir() {
        return Err(Error::InvalidArgument {
            arg: "input_dir",
            value: input_dir.display().to_string(),
        });
    }

    let mut report = BatchReport::default();
    for dir in iterate_scene_dirs(input_dir)? {
        let Some(archive) = scene_archive_in(&dir)? else {
            info!("Skipping {:?}: no scene archive", dir);
            report.skipped += 1;
            continue;
        };

        match process_scene_with(&archive, config, collaborators()) {
            Ok(product) => {
                report.processed += 1;
                report.products.push(product);
            }
            Err(e) => {
                error!("Failed to process {:?}: {}", archive, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}
