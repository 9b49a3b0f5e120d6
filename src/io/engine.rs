use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Environment variable the engine reads its working-memory budget from.
pub const RAM_HINT_VAR: &str = "OTB_MAX_RAM_HINT";

/// Errors reported by a raster-processing engine invocation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch {app}: {source}")]
    Spawn {
        app: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{app} exited with status {code:?}")]
    Failed { app: String, code: Option<i32> },
    #[error("{app} reported success but wrote no output at {path:?}")]
    MissingOutput { app: String, path: PathBuf },
    #[error("log sink error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Output pixel type requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Uint16,
    Float32,
}

impl PixelType {
    pub fn as_str(self) -> &'static str {
        match self {
            PixelType::Uint16 => "uint16",
            PixelType::Float32 => "float",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
    /// Output image path, including any `?&gdal:co:` extended filename options
    Output {
        path: String,
        pixel_type: Option<PixelType>,
    },
}

/// One engine application call: application name, ordered parameters and
/// the memory budget it may use.
#[derive(Debug, Clone, PartialEq)]
pub struct AppInvocation {
    pub app: String,
    pub params: Vec<(String, ParamValue)>,
    pub ram_mb: u32,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl AppInvocation {
    pub fn new(app: impl Into<String>, ram_mb: u32) -> Self {
        Self {
            app: app.into(),
            params: Vec::new(),
            ram_mb,
        }
    }

    fn push(mut self, key: &str, value: ParamValue) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn string(self, key: &str, value: impl Into<String>) -> Self {
        self.push(key, ParamValue::Str(value.into()))
    }

    pub fn path(self, key: &str, value: &Path) -> Self {
        self.push(key, ParamValue::Str(path_string(value)))
    }

    pub fn int(self, key: &str, value: i64) -> Self {
        self.push(key, ParamValue::Int(value))
    }

    pub fn float(self, key: &str, value: f64) -> Self {
        self.push(key, ParamValue::Float(value))
    }

    pub fn flag(self, key: &str, value: bool) -> Self {
        self.push(key, ParamValue::Bool(value))
    }

    pub fn paths(self, key: &str, values: &[PathBuf]) -> Self {
        let list = values.iter().map(|p| path_string(p)).collect();
        self.push(key, ParamValue::List(list))
    }

    /// Output image written at `path`; `options` is appended verbatim.
    pub fn output(
        self,
        key: &str,
        path: &Path,
        options: &str,
        pixel_type: Option<PixelType>,
    ) -> Self {
        let path = format!("{}{}", path_string(path), options);
        self.push(key, ParamValue::Output { path, pixel_type })
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`, for plain string and output parameters.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        match self.param(key)? {
            ParamValue::Str(s) => Some(s),
            ParamValue::Output { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Filesystem path of the first output parameter, extended filename stripped.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.params.iter().find_map(|(_, v)| match v {
            ParamValue::Output { path, .. } => {
                let plain = path.split_once('?').map_or(path.as_str(), |(p, _)| p);
                Some(PathBuf::from(plain))
            }
            _ => None,
        })
    }

    /// `-key value` argument list understood by the `otbcli_*` launchers.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.params.len() * 2);
        for (key, value) in &self.params {
            args.push(format!("-{key}"));
            match value {
                ParamValue::Str(s) => args.push(s.clone()),
                ParamValue::Int(i) => args.push(i.to_string()),
                ParamValue::Float(f) => args.push(f.to_string()),
                ParamValue::Bool(b) => args.push(b.to_string()),
                ParamValue::List(items) => args.extend(items.iter().cloned()),
                ParamValue::Output { path, pixel_type } => {
                    args.push(path.clone());
                    if let Some(pt) = pixel_type {
                        args.push(pt.as_str().to_string());
                    }
                }
            }
        }
        args
    }
}

/// Raster-processing engine: runs one application to completion and writes
/// its diagnostic output into `sink`.
pub trait RasterEngine {
    fn execute(&mut self, invocation: &AppInvocation, sink: &mut dyn Write)
    -> Result<(), EngineError>;
}

/// Engine backed by the Orfeo ToolBox command-line launchers (`otbcli_<App>`).
///
/// The memory budget is exported into each child's environment only.
#[derive(Debug, Clone, Default)]
pub struct OtbCliEngine {
    bin_dir: Option<PathBuf>,
}

impl OtbCliEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look launchers up in `bin_dir` instead of `PATH`.
    pub fn with_bin_dir(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: Some(bin_dir.into()),
        }
    }

    pub fn program(&self, app: &str) -> PathBuf {
        let launcher = format!("otbcli_{app}");
        match &self.bin_dir {
            Some(dir) => dir.join(launcher),
            None => PathBuf::from(launcher),
        }
    }
}

impl RasterEngine for OtbCliEngine {
    fn execute(
        &mut self,
        invocation: &AppInvocation,
        sink: &mut dyn Write,
    ) -> Result<(), EngineError> {
        let program = self.program(&invocation.app);
        let args = invocation.to_cli_args();
        debug!("{} {}", program.display(), args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .env(RAM_HINT_VAR, invocation.ram_mb.to_string())
            .output()
            .map_err(|source| EngineError::Spawn {
                app: invocation.app.clone(),
                source,
            })?;

        sink.write_all(&output.stdout)?;
        sink.write_all(&output.stderr)?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                app: invocation.app.clone(),
                code: output.status.code(),
            });
        }
        Ok(())
    }
}
