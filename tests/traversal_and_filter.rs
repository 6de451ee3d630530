use std::fs;
use std::path::{Path, PathBuf};

use rust_sift::finder::filter::{MatchMode, TimeField};
use rust_sift::finder::{FilterAttributes, FindOptions, Finder};
use tempfile::{tempdir, TempDir};

/// Three levels deep, four visible files, plus hidden entries along the way
fn build_tree() -> std::io::Result<TempDir> {
    let dir = tempdir()?;
    let root = dir.path();

    fs::create_dir_all(root.join("docs").join("2024").join("q1"))?;
    fs::create_dir_all(root.join(".git").join("objects"))?;
    fs::write(root.join("readme.md"), b"hello")?;
    fs::write(root.join("docs").join("report.txt"), vec![b'r'; 500])?;
    fs::write(root.join("docs").join("2024").join("notes.txt"), b"n")?;
    fs::write(root.join("docs").join("2024").join("q1").join("report-q1.md"), vec![b'q'; 50])?;
    fs::write(root.join("docs").join(".draft.txt"), b"hidden")?;
    fs::write(root.join(".git").join("config"), b"[core]")?;

    Ok(dir)
}

fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths
}

fn is_strictly_below(path: &Path, root: &Path) -> bool {
    path.parent() != Some(root)
}

#[tokio::test]
async fn test_hidden_entries_never_listed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::new(FindOptions::new().with_recursive(true));

    let result = finder.get_files([dir.path()]).await?;

    for path in result.files.iter().chain(result.dirs.iter()) {
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(!name.starts_with('.'), "hidden entry listed: {}", path.display());
        assert!(!path.starts_with(dir.path().join(".git")));
    }

    Ok(())
}

#[tokio::test]
async fn test_non_recursive_lists_direct_children_only() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::default();

    let result = finder.get_files([dir.path()]).await?;

    assert_eq!(result.files, vec![dir.path().join("readme.md")]);
    assert_eq!(result.dirs, vec![dir.path().join("docs")]);
    assert!(!result
        .files
        .iter()
        .chain(result.dirs.iter())
        .any(|p| is_strictly_below(p, dir.path())));

    Ok(())
}

#[tokio::test]
async fn test_recursive_finds_every_visible_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let root = dir.path();
    let finder = Finder::new(FindOptions::new().with_recursive(true));

    let result = finder.get_files([root]).await?;

    assert_eq!(
        sorted(result.files.clone()),
        sorted(vec![
            root.join("readme.md"),
            root.join("docs").join("report.txt"),
            root.join("docs").join("2024").join("notes.txt"),
            root.join("docs").join("2024").join("q1").join("report-q1.md"),
        ])
    );
    assert_eq!(
        sorted(result.dirs.clone()),
        sorted(vec![
            root.join("docs"),
            root.join("docs").join("2024"),
            root.join("docs").join("2024").join("q1"),
        ])
    );

    // classification matches what is on disk
    for file in &result.files {
        assert!(!file.is_dir());
    }
    for dir in &result.dirs {
        assert!(dir.is_dir());
    }

    Ok(())
}

#[tokio::test]
async fn test_multiple_roots() -> Result<(), Box<dyn std::error::Error>> {
    let first = build_tree()?;
    let second = tempdir()?;
    fs::write(second.path().join("extra.log"), b"log")?;

    let finder = Finder::new(FindOptions::new().with_recursive(true));
    let result = finder.get_files([first.path(), second.path()]).await?;

    assert_eq!(result.files.len(), 5);
    assert!(result.files.contains(&second.path().join("extra.log")));

    Ok(())
}

#[tokio::test]
async fn test_unreadable_root_surfaces_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let missing = dir.path().join("does-not-exist");
    let finder = Finder::new(FindOptions::new().with_recursive(true));

    let err = finder
        .get_files([dir.path().to_path_buf(), missing.clone()])
        .await
        .expect_err("one root cannot be listed");

    assert_eq!(err.source.path(), Some(&missing));
    assert!(err.partial.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_filter_and_semantics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::new(FindOptions::new().with_recursive(true));
    let files = finder.get_files([dir.path()]).await?.files;

    let spec = FilterAttributes::new().with_ext([".txt"]).with_contain("report");
    let kept = finder.filter_files(&files, spec.into()).await;

    assert_eq!(kept, vec![dir.path().join("docs").join("report.txt")]);

    Ok(())
}

#[tokio::test]
async fn test_filter_or_semantics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::new(FindOptions::new().with_recursive(true));
    let files = finder.get_files([dir.path()]).await?.files;

    let spec = FilterAttributes::new()
        .with_ext([".txt"])
        .with_contain("report")
        .with_mode(MatchMode::Or);
    let kept = finder.filter_files(&files, spec.into()).await;

    let expected: Vec<PathBuf> = files
        .iter()
        .filter(|p| {
            p.extension().map_or(false, |e| e == "txt")
                || p.to_string_lossy().contains("report")
        })
        .cloned()
        .collect();
    assert_eq!(kept, expected);
    assert_eq!(kept.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_filter_keeps_relative_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::new(FindOptions::new().with_recursive(true));
    let mut files = finder.get_files([dir.path()]).await?.files;
    files.reverse();

    let spec = FilterAttributes::new().with_size(">10");
    let kept = finder.filter_files(&files, spec.into()).await;

    let positions: Vec<usize> = kept
        .iter()
        .map(|k| files.iter().position(|f| f == k).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(kept.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_size_comparator_on_exact_size() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let file = dir.path().join("docs").join("report.txt");
    let finder = Finder::default();

    let spec = FilterAttributes::new().with_size(">100");
    assert_eq!(finder.filter_files(&[file.clone()], spec.into()).await, vec![file.clone()]);

    let spec = FilterAttributes::new().with_size("<100");
    assert!(finder.filter_files(&[file], spec.into()).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_find_combines_both_stages() -> Result<(), Box<dyn std::error::Error>> {
    let dir = build_tree()?;
    let finder = Finder::new(FindOptions::new().with_recursive(true));

    let spec = FilterAttributes::new()
        .with_ext([".md"])
        .with_time(TimeField::Modified, ">2001-01-01");
    let result = finder.find([dir.path()], spec.into()).await?;

    assert_eq!(result.files.len(), 2);
    assert_eq!(result.dirs.len(), 3);

    Ok(())
}
