//! Template source discovery
//!
//! Walks the template root to find compilable template files.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

/// File extensions recognized as template sources.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["html", "jinja", "j2"];

/// Recursively collect template files under `root`.
///
/// Hidden entries (names starting with a dot) are skipped, files and
/// directories alike. A missing root yields an empty list, not an error.
/// Results are sorted for deterministic compilation order.
pub fn discover_templates(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        if entry.file_type().is_file() && has_template_extension(path) {
            debug!(path = %path.display(), "discovered template");
            files.push(entry.into_path());
        }
    }

    files.sort();

    Ok(files)
}

/// Check if a directory entry should be skipped during traversal.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    // Never filter the root itself (depth 0)
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_templates_recursively() {
        let temp = TempDir::new().unwrap();

        fs::write(temp.path().join("invoice.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("letter.jinja"), "").unwrap();
        fs::create_dir(temp.path().join("reports")).unwrap();
        fs::write(temp.path().join("reports/summary.j2"), "").unwrap();

        // Non-template files are ignored
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::write(temp.path().join("style.css"), "").unwrap();

        let files = discover_templates(temp.path()).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.starts_with(temp.path())));
    }

    #[test]
    fn skips_hidden_files_and_directories() {
        let temp = TempDir::new().unwrap();

        fs::write(temp.path().join("visible.html"), "").unwrap();
        fs::write(temp.path().join(".hidden.html"), "").unwrap();
        fs::create_dir(temp.path().join(".cache")).unwrap();
        fs::write(temp.path().join(".cache/cached.html"), "").unwrap();

        let files = discover_templates(temp.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("visible.html"));
    }

    #[test]
    fn missing_root_yields_empty_list() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");

        let files = discover_templates(&missing).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn output_is_sorted() {
        let temp = TempDir::new().unwrap();

        fs::write(temp.path().join("zebra.html"), "").unwrap();
        fs::write(temp.path().join("aardvark.html"), "").unwrap();

        let files = discover_templates(temp.path()).unwrap();
        assert!(files[0].ends_with("aardvark.html"));
        assert!(files[1].ends_with("zebra.html"));
    }
}
