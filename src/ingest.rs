//! Ingestion pipeline orchestration.
//!
//! Coordinates the full build: loader → preprocessing → classification →
//! chunking → annotation → embedding → index. Per-file load failures are
//! collected and reported; an empty corpus aborts before the index
//! directory is touched.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use crate::annotate::annotate_chunks;
use crate::chunk::chunk_document;
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::RagError;
use crate::index::{IndexEntry, VectorIndex};
use crate::loader::load_corpus;
use crate::models::{AnnotatedDocument, DocumentType, IngestSummary};
use crate::preprocess::preprocess;

/// Build the vector index at `config.index.dir` from `config.corpus.dir`,
/// replacing any previous index.
pub async fn ingest(
    config: &Config,
    provider: &dyn EmbeddingProvider,
) -> std::result::Result<IngestSummary, RagError> {
    let report = load_corpus(&config.corpus)?;
    let loaded_records = report.documents.len();
    info!(
        dir = %config.corpus.dir.display(),
        records = loaded_records,
        failures = report.failures.len(),
        "corpus loaded"
    );

    let cleaned = preprocess(report.documents, config.corpus.min_content_chars);
    if cleaned.documents.is_empty() {
        return Err(RagError::EmptyCorpus(config.corpus.dir.clone()));
    }
    let total_docs = cleaned.documents.len();

    let mut chunks_by_type: BTreeMap<DocumentType, usize> =
        DocumentType::ALL.into_iter().map(|t| (t, 0)).collect();
    let mut annotated = Vec::new();
    for raw in cleaned.documents {
        let doc = AnnotatedDocument::from_raw(raw);
        let chunks = annotate_chunks(chunk_document(&doc));
        *chunks_by_type.entry(doc.document_type).or_insert(0) += chunks.len();
        annotated.extend(chunks);
    }
    info!(
        documents = total_docs,
        dropped = cleaned.dropped,
        chunks = annotated.len(),
        "chunked corpus"
    );

    let texts: Vec<String> = annotated.iter().map(|c| c.text.clone()).collect();
    let vectors =
        embedding::embed_documents(provider, &texts, config.embedding.batch_size)
            .await
            .map_err(RagError::Embedding)?;
    info!(model = provider.model_name(), vectors = vectors.len(), "embedded chunks");

    let entries: Vec<IndexEntry> = annotated
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
        .collect();
    let total_chunks = entries.len();

    let index = VectorIndex::build(
        &config.index.dir,
        provider.model_name(),
        provider.dims(),
        &entries,
    )
    .await
    .map_err(RagError::Index)?;
    index.close().await;
    info!(dir = %config.index.dir.display(), chunks = total_chunks, "index rebuilt");

    Ok(IngestSummary {
        total_docs,
        total_chunks,
        chunks_by_type,
        loaded_records,
        dropped_fragments: cleaned.dropped,
        load_failures: report.failures,
    })
}

/// Run the ingest command and print the summary.
pub async fn run_ingest(config: &Config, json: bool) -> Result<()> {
    let provider = embedding::create_provider(&config.embedding)?;
    let summary = ingest(config, provider.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("ingest {}", config.corpus.dir.display());
    println!("  records loaded: {}", summary.loaded_records);
    println!("  fragments dropped: {}", summary.dropped_fragments);
    println!("  documents: {}", summary.total_docs);
    println!("  chunks: {}", summary.total_chunks);
    for (doc_type, count) in &summary.chunks_by_type {
        println!("    {:<8} {}", doc_type.as_str(), count);
    }
    if !summary.load_failures.is_empty() {
        println!("  load failures: {}", summary.load_failures.len());
        for failure in &summary.load_failures {
            println!("    {}", failure);
        }
    }
    println!("  index: {}", config.index.dir.display());
    println!("ok");
    Ok(())
}
