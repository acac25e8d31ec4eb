//! Deterministic, pruned source discovery built on jwalk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{DirEntryIter, Parallelism, WalkDir};
use tracing::{debug, info, warn};

use codeaudit_core::{
    EligibleFile, ScanError, SkipKind, SkipWarning, is_reports_dir_name, is_run_artifact_name,
};

use crate::filter::{Eligibility, EligibilityFilter};

/// One step of the walk.
#[derive(Debug)]
pub enum WalkItem {
    /// A file that passed every eligibility check.
    Eligible(EligibleFile),
    /// A candidate that was left out, with the reason.
    Skipped(SkipWarning),
}

/// Walks a directory tree and yields eligible files in a stable order.
///
/// Entries are read one directory at a time on the calling thread and
/// sorted by name, so two walks over the same tree yield the same sequence.
/// Skip-listed directories are removed from their parent's listing before
/// they are read. Symlinked files are analyzed; symlinked directories are
/// not descended into.
pub struct SourceWalker {
    filter: Arc<EligibilityFilter>,
    output_dir: Option<PathBuf>,
}

impl SourceWalker {
    pub fn new(filter: EligibilityFilter) -> Self {
        Self {
            filter: Arc::new(filter),
            output_dir: None,
        }
    }

    /// Leave out the report directories, final reports and metadata files
    /// that runs write into `output_dir`, when the walk passes through it.
    pub fn with_output_dir(mut self, output_dir: &Path) -> Self {
        self.output_dir = resolve_dir(output_dir);
        self
    }

    pub fn filter(&self) -> &EligibilityFilter {
        &self.filter
    }

    /// Start walking `root`.
    pub fn walk(&self, root: &Path) -> Result<SourceFiles, ScanError> {
        let root = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let prune = Arc::clone(&self.filter);
        let output_dir = self.output_dir.clone();
        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, dir, _state, children| {
                let in_output_dir = output_dir.as_deref() == Some(dir);
                children.retain(|entry| {
                    let Ok(entry) = entry else {
                        return true;
                    };
                    let name = entry.file_name().to_string_lossy();
                    let is_dir = entry.file_type().is_dir();
                    if is_dir && prune.is_skipped_dir(&name) {
                        debug!(dir = %dir.display(), name = %name, "pruned directory");
                        return false;
                    }
                    let is_artifact = if is_dir {
                        is_reports_dir_name(&name)
                    } else {
                        is_run_artifact_name(&name)
                    };
                    if in_output_dir && is_artifact {
                        debug!(dir = %dir.display(), name = %name, "left out run artifact");
                        return false;
                    }
                    true
                });
            });

        Ok(SourceFiles {
            entries: walker.into_iter(),
            filter: Arc::clone(&self.filter),
            root,
        })
    }

    /// Walk `root` to completion, splitting eligible files from skips.
    pub fn collect(&self, root: &Path) -> Result<(Vec<EligibleFile>, Vec<SkipWarning>), ScanError> {
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for item in self.walk(root)? {
            match item {
                WalkItem::Eligible(file) => files.push(file),
                WalkItem::Skipped(warning) => skipped.push(warning),
            }
        }
        Ok((files, skipped))
    }
}

impl Default for SourceWalker {
    fn default() -> Self {
        Self::new(EligibilityFilter::default())
    }
}

/// Lazy iterator over a walk. Dropping it stops the walk.
pub struct SourceFiles {
    entries: DirEntryIter<((), ())>,
    filter: Arc<EligibilityFilter>,
    root: PathBuf,
}

impl SourceFiles {
    /// Canonical root of this walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn classify(&self, path: PathBuf) -> Option<WalkItem> {
        let extension = match self.filter.allowed_extension(&path) {
            Some(ext) => ext,
            None => {
                debug!(path = %path.display(), "extension not allowed");
                return None;
            }
        };

        let size = match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read file size, skipping");
                return Some(WalkItem::Skipped(SkipWarning::metadata_error(&path, &err)));
            }
        };

        match self.filter.check_size(size) {
            Eligibility::Eligible { size } => {
                let relative_path = path
                    .strip_prefix(&self.root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| path.clone());
                Some(WalkItem::Eligible(EligibleFile {
                    absolute_path: path,
                    relative_path,
                    size_bytes: size,
                    extension,
                }))
            }
            _ => {
                info!(
                    path = %path.display(),
                    size,
                    limit = self.filter.max_size_bytes(),
                    "skipping large file"
                );
                Some(WalkItem::Skipped(SkipWarning::too_large(
                    &path,
                    size,
                    self.filter.max_size_bytes(),
                )))
            }
        }
    }
}

impl Iterator for SourceFiles {
    type Item = WalkItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "walk error");
                    return Some(WalkItem::Skipped(SkipWarning::new(
                        path,
                        err.to_string(),
                        SkipKind::WalkError,
                    )));
                }
            };

            let file_type = entry.file_type();
            let path = entry.path();
            if file_type.is_symlink() {
                if path.is_dir() {
                    debug!(path = %path.display(), "not following directory symlink");
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            if let Some(item) = self.classify(path) {
                return Some(item);
            }
        }
    }
}

/// Absolute, symlink-resolved form of `path`, which may not exist yet.
fn resolve_dir(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Some(missing.iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        missing.push(existing.file_name()?.to_os_string());
        existing = existing.parent()?;
    }
}
