//! Category tags for indexed chunks.
//!
//! Every chunk entering the vector index starts with exactly one tag naming
//! its document category, so retrieved context still says where it came
//! from after embedding.

use sha2::{Digest, Sha256};

use crate::models::{AnnotatedChunk, Chunk, DocumentType};

pub fn category_prefix(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Cv => "[CV/RESUME CONTENT] ",
        DocumentType::Project => "[PROJECT DOCUMENTATION] ",
        DocumentType::Values => "[PERSONAL VALUES & PHILOSOPHY] ",
        DocumentType::General => "[GENERAL INFORMATION] ",
    }
}

/// Returns the category whose tag `text` starts with, if any.
pub fn prefix_category(text: &str) -> Option<DocumentType> {
    DocumentType::ALL
        .into_iter()
        .find(|t| text.starts_with(category_prefix(*t)))
}

/// Prepend the chunk's category tag. Consumes the chunk, so an
/// [`AnnotatedChunk`] can never be tagged a second time.
pub fn annotate_chunk(chunk: Chunk) -> AnnotatedChunk {
    let text = format!(
        "{}{}",
        category_prefix(chunk.metadata.document_type),
        chunk.text
    );
    let hash = content_hash(&text);
    AnnotatedChunk {
        text,
        metadata: chunk.metadata,
        hash,
    }
}

pub fn annotate_chunks(chunks: Vec<Chunk>) -> Vec<AnnotatedChunk> {
    chunks.into_iter().map(annotate_chunk).collect()
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, DocumentFormat};

    fn chunk(document_type: DocumentType, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source_file: "f.txt".into(),
                file_type: DocumentFormat::Text,
                document_type,
                page_number: None,
                chunk_id: 0,
                total_chunks: 1,
                chunk_type: document_type,
            },
        }
    }

    #[test]
    fn cv_chunk_gets_resume_tag() {
        let a = annotate_chunk(chunk(DocumentType::Cv, "Python, Java"));
        assert_eq!(a.text, "[CV/RESUME CONTENT] Python, Java");
        assert_eq!(a.metadata.document_type, DocumentType::Cv);
    }

    #[test]
    fn every_category_gets_exactly_one_matching_tag() {
        for t in DocumentType::ALL {
            let a = annotate_chunk(chunk(t, "body text"));
            assert_eq!(prefix_category(&a.text), Some(t));
            let rest = &a.text[category_prefix(t).len()..];
            assert_eq!(prefix_category(rest), None);
        }
    }

    #[test]
    fn prefixes_are_distinct() {
        let mut seen: Vec<&str> = DocumentType::ALL.into_iter().map(category_prefix).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn hash_tracks_annotated_text() {
        let a = annotate_chunk(chunk(DocumentType::Values, "Curiosity"));
        let b = annotate_chunk(chunk(DocumentType::General, "Curiosity"));
        assert_eq!(a.hash.len(), 64);
        assert_ne!(a.hash, b.hash);
    }
}
