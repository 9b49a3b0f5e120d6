//! Filesystem-backed fakes for the external collaborators.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ardpro::Collaborators;
use ardpro::io::{
    AppInvocation, ArchiveExtractor, BoundingBox, EngineError, ExtractOutput, ImageExtent,
    RasterEngine, RoiResolver,
};

pub type CallLog = Arc<Mutex<Vec<AppInvocation>>>;

/// Engine that records every call and touches the requested output file.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub calls: CallLog,
    pub fail_on: Option<String>,
}

impl RecordingEngine {
    pub fn failing_on(app: &str) -> Self {
        Self {
            fail_on: Some(app.to_string()),
            ..Self::default()
        }
    }

    pub fn apps(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.app.clone()).collect()
    }

    pub fn calls(&self) -> Vec<AppInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call(&self, app: &str) -> AppInvocation {
        self.calls()
            .into_iter()
            .find(|c| c.app == app)
            .unwrap_or_else(|| panic!("no {app} call"))
    }
}

impl RasterEngine for RecordingEngine {
    fn execute(
        &mut self,
        invocation: &AppInvocation,
        sink: &mut dyn Write,
    ) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(invocation.clone());
        writeln!(sink, "{}: running", invocation.app)?;
        if self.fail_on.as_deref() == Some(invocation.app.as_str()) {
            if let Some(out) = invocation.output_path() {
                // a crashing engine may leave a partial file behind
                fs::write(out, b"partial")?;
            }
            writeln!(sink, "{}: failed", invocation.app)?;
            return Err(EngineError::Failed {
                app: invocation.app.clone(),
                code: Some(1),
            });
        }
        if let Some(out) = invocation.output_path() {
            fs::write(out, invocation.app.as_bytes())?;
        }
        Ok(())
    }
}

/// Extractor laying out `IMG_<code>_<band>_0001/IMG_<code>_<band>_0001_R<r>C<c>.TIF` tiles.
#[derive(Clone)]
pub struct MockExtractor {
    pub code: String,
    pub ms_tiles: Vec<(u32, u32)>,
    pub pan_tiles: Vec<(u32, u32)>,
    pub exit_code: i32,
}

impl MockExtractor {
    pub fn new(code: &str, ms_tiles: &[(u32, u32)], pan_tiles: &[(u32, u32)]) -> Self {
        Self {
            code: code.to_string(),
            ms_tiles: ms_tiles.to_vec(),
            pan_tiles: pan_tiles.to_vec(),
            exit_code: 0,
        }
    }

    pub fn single_tile(code: &str) -> Self {
        Self::new(code, &[(1, 1)], &[(1, 1)])
    }

    pub fn broken(code: &str) -> Self {
        Self {
            exit_code: 9,
            ..Self::single_tile(code)
        }
    }
}

impl ArchiveExtractor for MockExtractor {
    fn extract(&self, _archive: &Path, dest: &Path) -> std::io::Result<ExtractOutput> {
        if self.exit_code != 0 {
            return Ok(ExtractOutput {
                stdout: String::new(),
                stderr: "End-of-central-directory signature not found".to_string(),
                code: self.exit_code,
            });
        }
        let product = dest.join(format!("{}_PRODUCT", self.code));
        for (band, tiles) in [("MS", &self.ms_tiles), ("P", &self.pan_tiles)] {
            let dir = product.join(format!("IMG_{}_{}_0001", self.code, band));
            fs::create_dir_all(&dir)?;
            for (r, c) in tiles {
                let name = format!("IMG_{}_{}_0001_R{}C{}.TIF", self.code, band, r, c);
                fs::write(dir.join(name), b"tile")?;
            }
            // sidecar files are ignored by discovery
            fs::write(dir.join(format!("DIM_{}_{}_0001.XML", self.code, band)), b"<Dimap/>")?;
        }
        Ok(ExtractOutput {
            stdout: format!("inflated {} tiles", self.ms_tiles.len() + self.pan_tiles.len()),
            stderr: String::new(),
            code: 0,
        })
    }
}

/// Resolver returning a fixed answer for every image.
#[derive(Clone, Copy)]
pub struct FixedRoiResolver(pub Option<ImageExtent>);

impl RoiResolver for FixedRoiResolver {
    fn resolve(&self, _roi: &BoundingBox, _image: &Path) -> ardpro::Result<Option<ImageExtent>> {
        Ok(self.0)
    }
}

pub fn overlap() -> FixedRoiResolver {
    FixedRoiResolver(Some(ImageExtent {
        ulx: 500_000.0,
        uly: 4_800_000.0,
        lrx: 510_000.0,
        lry: 4_790_000.0,
    }))
}

pub fn collaborators(
    engine: &RecordingEngine,
    extractor: MockExtractor,
    roi: FixedRoiResolver,
) -> Collaborators {
    Collaborators {
        engine: Box::new(engine.clone()),
        extractor: Box::new(extractor),
        roi_resolver: Box::new(roi),
    }
}

/// `<root>/<dir>/<archive name>`; the archive itself need not exist.
pub fn scene_archive(root: &Path, dir: &str, name: &str) -> PathBuf {
    let scene_dir = root.join(dir);
    fs::create_dir_all(&scene_dir).unwrap();
    scene_dir.join(name)
}

pub const PHR_SCENE: &str = "DS_PHR1A_20200101123045123_FR1_PX_E001N43_0101_01234.zip";
pub const SPOT_SCENE: &str = "DS_SPOT6_202001011230451_FR1_FR1_SV1_SV1_E001N43_01709.zip";

pub fn config(root: &Path) -> ardpro::RunConfig {
    ardpro::RunConfig {
        log_dir: root.join("log"),
        ..ardpro::RunConfig::default()
    }
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
