//! Query-time retrieval.
//!
//! Embeds a query with the same provider and normalization that built the
//! index, runs the nearest-neighbour search, and joins the hits into one
//! context block. [`Retriever::retrieve`] never fails: a missing index or a
//! provider error becomes a diagnostic string so the conversation can
//! carry on without context.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::RagError;
use crate::index::{ScoredChunk, VectorIndex};

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

pub struct Retriever {
    provider: Box<dyn EmbeddingProvider>,
    index: Option<VectorIndex>,
    index_dir: PathBuf,
}

impl Retriever {
    /// Open the index at `index_dir`. A missing or unreadable index is
    /// not an error here; it surfaces on every query instead.
    pub async fn open(index_dir: &Path, provider: Box<dyn EmbeddingProvider>) -> Self {
        let index = match VectorIndex::open(index_dir).await {
            Ok(index) => {
                if index.model() != provider.model_name() {
                    tracing::warn!(
                        index_model = index.model(),
                        provider_model = provider.model_name(),
                        "index was built with a different embedding model"
                    );
                }
                Some(index)
            }
            Err(e) => {
                tracing::warn!(dir = %index_dir.display(), error = %e, "vector index unavailable");
                None
            }
        };
        Self::with_index(index_dir, provider, index)
    }

    pub fn with_index(
        index_dir: &Path,
        provider: Box<dyn EmbeddingProvider>,
        index: Option<VectorIndex>,
    ) -> Self {
        Self {
            provider,
            index,
            index_dir: index_dir.to_path_buf(),
        }
    }

    /// Top-`k` chunks for `query`, best first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<ScoredChunk>, RagError> {
        let index = self.index.as_ref().ok_or_else(|| {
            RagError::RetrievalFailure(format!(
                "no index found at {}; run `codex ingest` first",
                self.index_dir.display()
            ))
        })?;

        let empty = index
            .is_empty()
            .await
            .map_err(|e| RagError::RetrievalFailure(format!("{:#}", e)))?;
        if empty {
            return Ok(Vec::new());
        }

        let query_vec = embedding::embed_query(self.provider.as_ref(), query)
            .await
            .map_err(|e| RagError::RetrievalFailure(format!("{:#}", e)))?;

        index
            .query(&query_vec, k)
            .await
            .map_err(|e| RagError::RetrievalFailure(format!("{:#}", e)))
    }

    /// Context block for `query`: chunk texts joined by
    /// [`CONTEXT_SEPARATOR`], `""` for an empty index, or a
    /// `Context retrieval error: ...` line on failure.
    pub async fn retrieve(&self, query: &str, k: usize) -> String {
        match self.search(query, k).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| hit.chunk.text)
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, continuing without context");
                let detail = match e {
                    RagError::RetrievalFailure(detail) => detail,
                    other => other.to_string(),
                };
                format!("Context retrieval error: {}", detail)
            }
        }
    }

    pub async fn close(self) {
        if let Some(index) = self.index {
            index.close().await;
        }
    }
}

/// Run the search command: print the top-`k` chunks for `query`.
pub async fn run_search(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }
    let k = k.unwrap_or(config.retrieval.k);
    let provider = embedding::create_provider(&config.embedding)?;
    let retriever = Retriever::open(&config.index.dir, provider).await;
    let hits = match retriever.search(query, k).await {
        Ok(hits) => hits,
        Err(e) => {
            retriever.close().await;
            return Err(e.into());
        }
    };

    if hits.is_empty() {
        println!("No results.");
    }
    for (i, hit) in hits.iter().enumerate() {
        let meta = &hit.chunk.metadata;
        let page = meta
            .page_number
            .map(|p| format!(" p.{}", p))
            .unwrap_or_default();
        println!(
            "{}. [{:.2}] {} / {}{}",
            i + 1,
            hit.score,
            meta.document_type,
            meta.source_file,
            page
        );
        println!("    chunk: {} of {}", meta.chunk_id + 1, meta.total_chunks);
        println!(
            "    excerpt: \"{}\"",
            excerpt(&hit.chunk.text, 240).replace('\n', " ").trim()
        );
        println!();
    }

    retriever.close().await;
    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
