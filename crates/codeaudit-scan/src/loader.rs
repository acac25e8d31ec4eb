//! Permissive file loading with a character budget.

use std::borrow::Cow;
use std::path::Path;

use codeaudit_core::ScanError;

/// Marker appended when content is cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "\n\n... (truncated)";

/// Reads files as text, replacing invalid UTF-8 and enforcing `max_chars`.
#[derive(Debug, Clone, Copy)]
pub struct ContentLoader {
    max_chars: usize,
}

impl ContentLoader {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Read `path` and truncate it to the budget.
    pub fn load(&self, path: &Path) -> Result<String, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(truncate_chars(&text, self.max_chars).into_owned())
    }
}

/// Keep the first `max_chars` characters of `text`, appending
/// [`TRUNCATION_MARKER`] when anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_under_budget_borrows() {
        assert!(matches!(truncate_chars("hello", 5), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let out = truncate_chars("ééééé", 3);
        assert_eq!(out, format!("ééé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_load_replaces_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.py");
        fs::write(&path, [b'o', b'k', 0xff, 0xfe, b'!']).unwrap();

        let text = ContentLoader::new(100).load(&path).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ContentLoader::new(10).load(Path::new("/missing/x.py")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }
}
