//! Document loader.
//!
//! Reads every admitted file in a flat corpus directory and produces one
//! [`RawDocument`] per text file, or one per page for PDFs. A file that
//! cannot be read is recorded as a [`LoadFailure`] and the walk carries on.

use std::path::Path;

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{LoadFailure, RagError};
use crate::extract;
use crate::models::{DocumentFormat, RawDocument};

/// Partial-success result of loading a corpus.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<RawDocument>,
    pub failures: Vec<LoadFailure>,
}

/// Load every file in `corpus.dir` whose name matches `include_globs`.
///
/// Entries are visited in file-name order. Only an unreadable corpus
/// directory (or an invalid glob) is an error; per-file problems land in
/// [`LoadReport::failures`].
pub fn load_corpus(corpus: &CorpusConfig) -> std::result::Result<LoadReport, RagError> {
    let root = &corpus.dir;
    if !root.is_dir() {
        return Err(RagError::CorpusUnreadable {
            path: root.clone(),
            reason: "not a directory".to_string(),
        });
    }

    let include_set =
        build_globset(&corpus.include_globs).map_err(|e| RagError::CorpusUnreadable {
            path: root.clone(),
            reason: format!("invalid include glob: {}", e),
        })?;

    let mut report = LoadReport::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                report.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !include_set.is_match(&*name) {
            debug!(path = %path.display(), "not matched by include_globs");
            continue;
        }

        match load_file(path) {
            Ok(docs) => {
                debug!(path = %path.display(), records = docs.len(), "loaded");
                report.documents.extend(docs);
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "failed to load document, skipping");
                report.failures.push(LoadFailure {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }

    Ok(report)
}

/// Load a single file into one or more records.
pub fn load_file(path: &Path) -> std::result::Result<Vec<RawDocument>, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let format = DocumentFormat::from_path(path);

    match format {
        DocumentFormat::Pdf => {
            let extracted = extract::extract_pdf_pages(&bytes).map_err(|e| e.to_string())?;
            if !extracted.unreadable.is_empty() {
                tracing::warn!(
                    path = %path.display(),
                    pages = ?extracted.unreadable,
                    "skipped PDF pages whose text could not be extracted"
                );
            }
            Ok(extracted
                .pages
                .into_iter()
                .map(|page| RawDocument {
                    content: page.text,
                    source_path: path.to_path_buf(),
                    format,
                    page_number: page.page_number,
                })
                .collect())
        }
        DocumentFormat::Text | DocumentFormat::Markdown => {
            let content =
                String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {}", e))?;
            Ok(vec![RawDocument {
                content,
                source_path: path.to_path_buf(),
                format,
                page_number: None,
            }])
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}
