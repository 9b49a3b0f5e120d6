use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

/// Per-scene diagnostic sink: line-buffered, append-only.
///
/// One scene owns one sink, so output of concurrently running scene
/// processes never interleaves.
pub struct SceneLog {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl SceneLog {
    /// Open `<log_dir>/<scene basename>.log`, creating `log_dir` if needed.
    pub fn open(log_dir: &Path, scene: &Path) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(Self::file_name(scene));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: LineWriter::new(file),
        })
    }

    /// `DS_PHR1A_x.zip` → `DS_PHR1A_x.log`
    pub fn file_name(scene: &Path) -> String {
        let name = scene
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string());
        match name.strip_suffix(".zip").or_else(|| name.strip_suffix(".ZIP")) {
            Some(stem) => format!("{stem}.log"),
            None => format!("{name}.log"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for SceneLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
