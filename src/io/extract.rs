use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Captured result of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl ExtractOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Unpacks a scene archive into a destination directory.
///
/// A non-zero `code` aborts the scene; `Err` is reserved for failing to run
/// the extractor at all.
pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> std::io::Result<ExtractOutput>;
}

/// Extractor shelling out to Info-ZIP `unzip`. Existing files are kept, so
/// re-running over a populated directory is cheap.
#[derive(Debug, Clone)]
pub struct UnzipExtractor {
    program: PathBuf,
}

impl Default for UnzipExtractor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("unzip"),
        }
    }
}

impl UnzipExtractor {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ArchiveExtractor for UnzipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> std::io::Result<ExtractOutput> {
        debug!("Extracting {:?} into {:?}", archive, dest);
        let output = Command::new(&self.program)
            .arg("-n")
            .arg("-qq")
            .arg(archive)
            .arg("-d")
            .arg(dest)
            .output()?;

        Ok(ExtractOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // killed by a signal
            code: output.status.code().unwrap_or(-1),
        })
    }
}
