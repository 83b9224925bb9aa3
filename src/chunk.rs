//! Type-aware recursive text chunker.
//!
//! Splits each [`AnnotatedDocument`] into overlapping [`Chunk`]s using a
//! size/overlap/separator policy chosen by the document's category.
//!
//! # Algorithm
//!
//! 1. Pick the first separator in the policy's list that occurs in the
//!    text (the empty separator always matches and means "characters").
//! 2. Split on it, keeping the separator at the start of the following
//!    piece.
//! 3. Pieces shorter than `chunk_size` are merged greedily into chunks of
//!    at most `chunk_size` characters. When a chunk is emitted, pieces are
//!    dropped from its front until at most `chunk_overlap` characters
//!    remain; those carry over into the next chunk.
//! 4. Pieces of `chunk_size` or more are split again with the remaining
//!    separators.
//!
//! All lengths are measured in characters, not bytes. The splitter is
//! deterministic: identical input always yields identical chunks.
//!
//! # Example
//!
//! ```rust
//! use persona_codex::chunk::{split_text, ChunkPolicy};
//! use persona_codex::models::DocumentType;
//!
//! let policy = ChunkPolicy::for_type(DocumentType::Values);
//! let chunks = split_text("Curiosity. Resilience. Continuous learning.", &policy);
//! assert_eq!(chunks, vec!["Curiosity. Resilience. Continuous learning."]);
//! ```

use std::collections::VecDeque;

use crate::models::{AnnotatedDocument, Chunk, ChunkMetadata, DocumentType};

const CV_SEPARATORS: &[&str] = &["\n\n", "\n", "• ", ". ", "; ", ", ", " ", ""];
const PROJECT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", ", ", " ", ""];
const VALUES_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "; ", ", ", " ", ""];
const GENERAL_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", ", ", " ", ""];

/// Size, overlap and separator priority for one document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: &'static [&'static str],
}

impl ChunkPolicy {
    pub fn for_type(document_type: DocumentType) -> Self {
        match document_type {
            // Discrete skill and experience statements.
            DocumentType::Cv => Self {
                chunk_size: 800,
                chunk_overlap: 200,
                separators: CV_SEPARATORS,
            },
            // Keep related project narrative together.
            DocumentType::Project => Self {
                chunk_size: 1200,
                chunk_overlap: 300,
                separators: PROJECT_SEPARATORS,
            },
            // Principle statements are short.
            DocumentType::Values => Self {
                chunk_size: 600,
                chunk_overlap: 150,
                separators: VALUES_SEPARATORS,
            },
            DocumentType::General => Self {
                chunk_size: 1000,
                chunk_overlap: 250,
                separators: GENERAL_SEPARATORS,
            },
        }
    }
}

/// Split a document into chunks with contiguous zero-based `chunk_id`s.
///
/// Returns an empty vector only for text with no non-whitespace content.
pub fn chunk_document(doc: &AnnotatedDocument) -> Vec<Chunk> {
    let policy = ChunkPolicy::for_type(doc.document_type);
    let pieces = split_text(&doc.content, &policy);
    let total_chunks = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_id, text)| Chunk {
            text,
            metadata: ChunkMetadata {
                source_file: doc.source_file.clone(),
                file_type: doc.file_type,
                document_type: doc.document_type,
                page_number: doc.page_number,
                chunk_id,
                total_chunks,
                chunk_type: doc.document_type,
            },
        })
        .collect()
}

/// Split `text` according to `policy`. Every returned string is trimmed,
/// non-empty and at most `policy.chunk_size` characters long.
pub fn split_text(text: &str, policy: &ChunkPolicy) -> Vec<String> {
    Splitter { policy }.split(text, policy.separators)
}

struct Splitter<'p> {
    policy: &'p ChunkPolicy,
}

impl Splitter<'_> {
    fn split(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);
        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.policy.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if remaining.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.policy.chunk_size;
        let overlap = self.policy.chunk_overlap;

        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > size && !window.is_empty() {
                push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());
                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }

        push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());
        chunks
    }
}

fn pick_separator<'s>(
    text: &str,
    separators: &'s [&'static str],
) -> (&'static str, &'s [&'static str]) {
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return ("", &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, attaching each separator to the piece after it.
/// The empty separator splits into single characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
