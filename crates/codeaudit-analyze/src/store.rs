//! Per-file report persistence and collision-free artifact naming.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use codeaudit_core::{FileReport, REPORTS_DIR_PREFIX, RunStamp};

use crate::error::AnalysisError;

const MAX_SUFFIX: usize = 10_000;

/// Create `<dir>/<stem>.<ext>`, or `<stem>_2.<ext>`, `<stem>_3.<ext>`...
/// when the name is taken. Never opens an existing file.
pub fn create_unique(dir: &Path, stem: &str, ext: &str) -> io::Result<(File, PathBuf)> {
    for n in 1..=MAX_SUFFIX {
        let name = if n == 1 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{n}.{ext}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {stem}.{ext} in {}", dir.display()),
    ))
}

/// Create a fresh directory `<parent>/<stem>` (or a suffixed variant).
pub fn create_unique_dir(parent: &Path, stem: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(parent)?;
    for n in 1..=MAX_SUFFIX {
        let path = if n == 1 {
            parent.join(stem)
        } else {
            parent.join(format!("{stem}_{n}"))
        };
        match std::fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free directory name for {stem} in {}", parent.display()),
    ))
}

/// Write `contents` to a new uniquely named file.
pub fn write_unique(dir: &Path, stem: &str, ext: &str, contents: &str) -> Result<PathBuf, AnalysisError> {
    std::fs::create_dir_all(dir).map_err(|e| AnalysisError::io(dir, e))?;
    let (mut file, path) = create_unique(dir, stem, ext).map_err(|e| AnalysisError::io(dir, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| AnalysisError::io(&path, e))?;
    Ok(path)
}

/// Flatten a relative path into a single file name component.
pub fn safe_name(relative: &Path) -> String {
    let joined = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_");
    let cleaned = joined.replace("..", "");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Header placed at the top of every per-file report.
pub fn report_header(display_path: &str) -> String {
    format!("# Analysis of file: {display_path}\n\n")
}

/// Persists per-file reports into one directory per run.
#[derive(Debug)]
pub struct ReportStore {
    output_dir: PathBuf,
    stamp: RunStamp,
    dir: Option<PathBuf>,
}

impl ReportStore {
    pub fn new(output_dir: impl Into<PathBuf>, stamp: RunStamp) -> Self {
        Self {
            output_dir: output_dir.into(),
            stamp,
            dir: None,
        }
    }

    /// Report directory, once the first report has been stored.
    pub fn reports_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Store the report for `relative_path`.
    pub fn store(&mut self, relative_path: &Path, body: &str) -> Result<FileReport, AnalysisError> {
        let dir = self.ensure_dir()?;
        let mut report = FileReport {
            relative_path: relative_path.to_path_buf(),
            report_path: PathBuf::new(),
            content: String::new(),
        };
        report.content = format!("{}{}", report_header(&report.display_path()), body);

        let stem = format!("{}_{}", safe_name(relative_path), self.stamp);
        report.report_path = write_unique(&dir, &stem, "md", &report.content)?;
        Ok(report)
    }

    fn ensure_dir(&mut self) -> Result<PathBuf, AnalysisError> {
        if let Some(ref dir) = self.dir {
            return Ok(dir.clone());
        }
        let stem = format!("{REPORTS_DIR_PREFIX}_{}", self.stamp);
        let dir = create_unique_dir(&self.output_dir, &stem)
            .map_err(|e| AnalysisError::io(&self.output_dir, e))?;
        self.dir = Some(dir.clone());
        Ok(dir)
    }
}
