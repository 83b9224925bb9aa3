//! Text normalization ahead of chunking.
//!
//! Collapses whitespace runs to single spaces and drops records that are
//! too short to carry useful information once embedded.

use crate::models::RawDocument;

/// Output of [`preprocess`].
#[derive(Debug, Default)]
pub struct Preprocessed {
    pub documents: Vec<RawDocument>,
    /// Number of records dropped for falling below the threshold.
    pub dropped: usize,
}

/// Trim and collapse every whitespace run in `text` to a single space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean every document, keeping only those with at least
/// `min_content_chars` characters afterwards.
pub fn preprocess(documents: Vec<RawDocument>, min_content_chars: usize) -> Preprocessed {
    let mut out = Preprocessed::default();
    for doc in documents {
        let cleaned = clean_text(&doc.content);
        if cleaned.chars().count() < min_content_chars {
            tracing::debug!(
                source = %doc.source_path.display(),
                page = ?doc.page_number,
                chars = cleaned.chars().count(),
                "dropping near-empty fragment"
            );
            out.dropped += 1;
            continue;
        }
        out.documents.push(doc.with_content(cleaned));
    }
    out
}
