//! Shallow clones of GitHub repositories into temporary directories.

use std::path::{Path, PathBuf};

use git2::FetchOptions;
use git2::build::RepoBuilder;
use tempfile::TempDir;
use tracing::info;
use url::Url;

use codeaudit_core::ScanError;

/// Whether `url` points at github.com.
pub fn is_github_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| host == "github.com" || host == "www.github.com")
}

/// Repository name from the last path segment, without a `.git` suffix.
pub fn repo_name(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}

/// A cloned repository. The clone is removed when this value is dropped
/// unless [`ClonedRepo::keep`] is called.
#[derive(Debug)]
pub struct ClonedRepo {
    temp: TempDir,
    path: PathBuf,
}

impl ClonedRepo {
    /// Checkout directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the clone on disk and return its checkout directory.
    pub fn keep(self) -> PathBuf {
        let _parent = self.temp.keep();
        self.path
    }
}

/// Shallow-clone a GitHub repository into a fresh temporary directory.
pub fn clone_github_repo(url: &str) -> Result<ClonedRepo, ScanError> {
    if !is_github_url(url) {
        return Err(ScanError::InvalidUrl {
            url: url.to_string(),
        });
    }
    let name = repo_name(url).ok_or_else(|| ScanError::InvalidUrl {
        url: url.to_string(),
    })?;

    let temp = tempfile::Builder::new()
        .prefix("codeaudit_github_")
        .tempdir()
        .map_err(|e| ScanError::io(std::env::temp_dir(), e))?;
    let path = temp.path().join(&name);

    info!(url, dest = %path.display(), "cloning repository");

    let mut fetch = FetchOptions::new();
    fetch.depth(1);
    RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, &path)
        .map_err(|e| ScanError::Clone {
            url: url.to_string(),
            message: e.message().to_string(),
        })?;

    info!(dest = %path.display(), "clone complete");
    Ok(ClonedRepo { temp, path })
}
