//! Optional settings file (`codeaudit.toml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_EXTENSIONS, DEFAULT_SKIP_DIRS};

/// File name looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "codeaudit.toml";

/// Errors loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Values read from a settings file. Every field is optional; unset fields
/// keep the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub max_files: Option<usize>,
    pub max_size_bytes: Option<u64>,
    pub max_chars: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub model: Option<String>,
    /// Replaces the default extension list.
    pub allowed_extensions: Option<Vec<String>>,
    /// Added to the extension list.
    pub extra_extensions: Vec<String>,
    /// Replaces the default skip list.
    pub skip_dirs: Option<Vec<String>>,
    /// Added to the skip list.
    pub extra_skip_dirs: Vec<String>,
}

impl Settings {
    /// Load settings from a specific file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Locate and load settings.
    ///
    /// An explicit path must exist. Otherwise `./codeaudit.toml` is tried,
    /// then `<config dir>/codeaudit/config.toml`; when neither exists the
    /// defaults are returned along with `None`.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path).map(|s| (s, Some(path.to_path_buf())));
        }

        let candidates = [
            Some(PathBuf::from(LOCAL_SETTINGS_FILE)),
            dirs::config_dir().map(|d| d.join("codeaudit").join("config.toml")),
        ];

        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::load(&path).map(|s| (s, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Builder pre-populated with these settings on top of the defaults.
    pub fn to_builder(&self) -> AnalysisConfigBuilder {
        let mut builder = AnalysisConfig::builder();

        if let Some(v) = self.max_files {
            builder.max_files(v);
        }
        if let Some(v) = self.max_size_bytes {
            builder.max_size_bytes(v);
        }
        if let Some(v) = self.max_chars {
            builder.max_chars(v);
        }
        if let Some(ref v) = self.output_dir {
            builder.output_dir(v.clone());
        }
        if let Some(ref v) = self.model {
            builder.model(v.clone());
        }

        let mut extensions: Vec<String> = match self.allowed_extensions {
            Some(ref list) => list.clone(),
            None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };
        extensions.extend(self.extra_extensions.iter().cloned());
        builder.allowed_extensions(normalize_extensions(extensions));

        let mut skip_dirs: Vec<String> = match self.skip_dirs {
            Some(ref list) => list.clone(),
            None => DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
        };
        skip_dirs.extend(self.extra_skip_dirs.iter().cloned());
        builder.skip_dirs(unique(skip_dirs.into_iter().map(|d| d.trim().to_string())));

        builder
    }
}

fn normalize_extensions(extensions: Vec<String>) -> Vec<String> {
    unique(
        extensions
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase()),
    )
}

fn unique(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_and_extend() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("codeaudit.toml");
        std::fs::write(
            &path,
            "max_files = 7\nextra_extensions = [\".GO\", \"rb\"]\nextra_skip_dirs = [\"dist\"]\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        let config = settings.to_builder().build().unwrap();

        assert_eq!(config.max_files, 7);
        assert!(config.allows_extension("go"));
        assert!(config.allows_extension("rb"));
        assert!(config.allows_extension("py"));
        assert!(config.skips_dir("dist"));
        assert!(config.skips_dir(".git"));
    }

    #[test]
    fn test_replace_lists() {
        let settings = Settings {
            allowed_extensions: Some(vec!["py".to_string()]),
            skip_dirs: Some(vec!["build".to_string()]),
            ..Settings::default()
        };
        let config = settings.to_builder().build().unwrap();

        assert_eq!(config.allowed_extensions, vec!["py".to_string()]);
        assert!(!config.skips_dir(".git"));
        assert!(config.skips_dir("build"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "max_filez = 3\n").unwrap();

        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = Settings::discover(Some(Path::new("/no/such/codeaudit.toml")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
