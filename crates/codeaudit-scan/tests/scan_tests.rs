use codeaudit_scan::{
    AnalysisConfig, ContentLoader, EligibilityFilter, ScanError, SkipKind, SourceWalker,
    TRUNCATION_MARKER, WalkItem, truncate_chars,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("app/models")).unwrap();
    fs::create_dir_all(root.join("venv/lib")).unwrap();
    fs::create_dir_all(root.join("__pycache__")).unwrap();

    fs::write(root.join("setup.cfg"), "[metadata]").unwrap();
    fs::write(root.join("app/main.py"), "print('hi')").unwrap();
    fs::write(root.join("app/models/user.py"), "class User: ...").unwrap();
    fs::write(root.join("app/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
    fs::write(root.join("app/huge.json"), vec![b' '; 4096]).unwrap();
    fs::write(root.join("venv/lib/site.py"), "x").unwrap();
    fs::write(root.join("__pycache__/main.pyc"), "x").unwrap();

    temp
}

fn filter(max_size: u64) -> EligibilityFilter {
    let config = AnalysisConfig::builder()
        .max_size_bytes(max_size)
        .build()
        .unwrap();
    EligibilityFilter::from_config(&config)
}

#[test]
fn test_walk_order_and_pruning() {
    let repo = create_repo();
    let walker = SourceWalker::new(filter(1024));

    let (files, skipped) = walker.collect(repo.path()).unwrap();
    let names: Vec<String> = files.iter().map(|f| f.display_path()).collect();

    assert_eq!(names, vec!["app/main.py", "app/models/user.py", "setup.cfg"]);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].kind, SkipKind::TooLarge);
    assert!(skipped[0].path.ends_with("app/huge.json"));
}

#[test]
fn test_walk_is_repeatable() {
    let repo = create_repo();
    let walker = SourceWalker::new(filter(1024 * 1024));

    let first: Vec<PathBuf> = walker
        .collect(repo.path())
        .unwrap()
        .0
        .into_iter()
        .map(|f| f.relative_path)
        .collect();
    let second: Vec<PathBuf> = walker
        .collect(repo.path())
        .unwrap()
        .0
        .into_iter()
        .map(|f| f.relative_path)
        .collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_walk_can_stop_early() {
    let repo = create_repo();
    let walker = SourceWalker::new(filter(1024 * 1024));

    let first_two: Vec<_> = walker
        .walk(repo.path())
        .unwrap()
        .filter_map(|item| match item {
            WalkItem::Eligible(file) => Some(file),
            WalkItem::Skipped(_) => None,
        })
        .take(2)
        .collect();

    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[0].extension, "json");
}

#[test]
fn test_walk_missing_root() {
    let temp = TempDir::new().unwrap();
    let result = SourceWalker::default().walk(&temp.path().join("absent"));
    assert!(matches!(result, Err(ScanError::NotFound { .. })));
}

#[test]
fn test_loader_truncates_and_replaces() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    let mut bytes = "héllo wörld".as_bytes().to_vec();
    bytes.push(0xc3);
    fs::write(&path, &bytes).unwrap();

    let text = ContentLoader::new(5).load(&path).unwrap();
    assert_eq!(text, format!("héllo{TRUNCATION_MARKER}"));

    let text = ContentLoader::new(100).load(&path).unwrap();
    assert!(text.ends_with('\u{FFFD}'));
}

#[test]
fn test_truncate_chars_within_budget() {
    assert_eq!(truncate_chars("abc", 3), "abc");
    assert_eq!(truncate_chars("abcd", 3), format!("abc{TRUNCATION_MARKER}"));
}
