use std::path::Path;

use anyhow::Result;
use tracing::info;
use walkdir::WalkDir;

use crate::paths::{parse_file_path, ArchiveFileRow};

/// Walk the archive root and return (pdf_path, stem) pairs for every
/// drawing-set PDF found. These fill the conversion queue.
pub fn discover_documents(root: &Path) -> Result<Vec<(String, String)>> {
    info!("Scanning for drawing-set PDFs under {}", root.display());

    let mut docs = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        docs.push((path.to_string_lossy().into_owned(), stem.to_string()));
    }

    info!("Drawing-set PDFs found: {}", docs.len());
    Ok(docs)
}

/// Walk the archive root and tokenize every project file path into a
/// labeled row. Paths that do not look like project files are skipped by
/// the tokenizer.
pub fn scan_archive(root: &Path) -> Result<Vec<ArchiveFileRow>> {
    let mut total = 0usize;
    let mut rows = Vec::new();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        total += 1;
        if let Some(row) = parse_file_path(&entry.path().to_string_lossy()) {
            rows.push(row);
        }
    }

    info!("Project files after labeling: {} of {}", rows.len(), total);
    Ok(rows)
}
