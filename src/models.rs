//! Core data models used throughout the codex.
//!
//! These types represent the documents, chunks, and conversation turns that
//! flow through the ingestion and query pipeline. Records are built once and
//! never mutated in place; each stage produces a new, richer record.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::LoadFailure;

/// Source file format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Text,
    Markdown,
}

impl DocumentFormat {
    /// `.pdf` is paginated; everything else is read as UTF-8 text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "md" | "markdown" => DocumentFormat::Markdown,
            _ => DocumentFormat::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Text => "txt",
            DocumentFormat::Markdown => "md",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" => Some(DocumentFormat::Text),
            "md" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document category, inferred from the source file name.
///
/// Drives both the chunking policy and the provenance tag prepended to
/// every indexed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Cv,
    Project,
    Values,
    General,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Cv,
        DocumentType::Project,
        DocumentType::Values,
        DocumentType::General,
    ];

    /// Classify a file name by case-insensitive substring match.
    ///
    /// Checked in the order project, values, cv; first match wins, so
    /// `cv_project_notes.md` is a project document.
    pub fn classify(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.contains("project") {
            DocumentType::Project
        } else if lower.contains("values") {
            DocumentType::Values
        } else if lower.contains("cv") {
            DocumentType::Cv
        } else {
            DocumentType::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cv => "cv",
            DocumentType::Project => "project",
            DocumentType::Values => "values",
            DocumentType::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        DocumentType::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text read from one source file, or one page of a paginated file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub content: String,
    pub source_path: PathBuf,
    pub format: DocumentFormat,
    /// 1-based page number for paginated formats.
    pub page_number: Option<u32>,
}

impl RawDocument {
    /// Returns a copy carrying `content` in place of the original text.
    pub fn with_content(&self, content: String) -> Self {
        Self {
            content,
            source_path: self.source_path.clone(),
            format: self.format,
            page_number: self.page_number,
        }
    }

    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// A cleaned document with its typed provenance metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedDocument {
    pub content: String,
    pub source_path: PathBuf,
    pub source_file: String,
    pub file_type: DocumentFormat,
    pub document_type: DocumentType,
    pub page_number: Option<u32>,
}

impl AnnotatedDocument {
    pub fn from_raw(raw: RawDocument) -> Self {
        let source_file = raw.file_name();
        let document_type = DocumentType::classify(&source_file);
        Self {
            content: raw.content,
            source_path: raw.source_path,
            source_file,
            file_type: raw.format,
            document_type,
            page_number: raw.page_number,
        }
    }
}

/// Metadata carried by every chunk, extending the parent document's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    pub source_file: String,
    pub file_type: DocumentFormat,
    pub document_type: DocumentType,
    pub page_number: Option<u32>,
    /// Zero-based position within the parent document.
    pub chunk_id: usize,
    pub total_chunks: usize,
    pub chunk_type: DocumentType,
}

/// A bounded span of a document's cleaned text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk whose text starts with its category tag.
///
/// Only produced by [`annotate_chunk`](crate::annotate::annotate_chunk),
/// which consumes a [`Chunk`], so a tag can never be applied twice.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// Who said a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    /// Document records (files or pages) that survived preprocessing.
    pub total_docs: usize,
    pub total_chunks: usize,
    pub chunks_by_type: BTreeMap<DocumentType, usize>,
    /// Records produced by the loader before preprocessing.
    pub loaded_records: usize,
    /// Records dropped for being shorter than the content threshold.
    pub dropped_fragments: usize,
    pub load_failures: Vec<LoadFailure>,
}
