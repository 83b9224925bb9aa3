//! Persistent vector index.
//!
//! One SQLite file (`index.sqlite`) inside the configured index directory
//! holds every annotated chunk, its metadata, and its normalized
//! embedding as a little-endian f32 BLOB. A `meta` table records which
//! embedding model built the index.
//!
//! # Schema
//!
//! ```sql
//! entries (position INTEGER PRIMARY KEY, text, source_file, file_type,
//!          document_type, page_number, chunk_id, total_chunks,
//!          chunk_type, hash, embedding BLOB)
//! meta    (key TEXT PRIMARY KEY, value TEXT)
//! ```
//!
//! [`VectorIndex::build`] deletes the previous index file (and its WAL
//! siblings) before writing, so a rebuild replaces the index wholesale.
//! Other files in the directory are left alone. Queries are exact:
//! every stored vector is scored against the query and the top `k` kept.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::embedding::{blob_to_vec, dot, vec_to_blob};
use crate::models::{AnnotatedChunk, ChunkMetadata, DocumentFormat, DocumentType};

pub const INDEX_FILE: &str = "index.sqlite";

const CREATE_ENTRIES: &str = r#"
CREATE TABLE entries (
    position      INTEGER PRIMARY KEY,
    text          TEXT NOT NULL,
    source_file   TEXT NOT NULL,
    file_type     TEXT NOT NULL,
    document_type TEXT NOT NULL,
    page_number   INTEGER,
    chunk_id      INTEGER NOT NULL,
    total_chunks  INTEGER NOT NULL,
    chunk_type    TEXT NOT NULL,
    hash          TEXT NOT NULL,
    embedding     BLOB NOT NULL
)
"#;

const CREATE_META: &str = r#"
CREATE TABLE meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// A chunk paired with its normalized embedding, ready to be stored.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: AnnotatedChunk,
    pub embedding: Vec<f32>,
}

/// A stored chunk returned by [`VectorIndex::query`].
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: AnnotatedChunk,
    /// Cosine similarity to the query (dot product of unit vectors).
    pub score: f32,
    /// Insertion order; breaks score ties.
    pub position: i64,
}

/// Descriptive metadata recorded at build time.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub path: PathBuf,
    pub model: String,
    pub dims: usize,
    pub built_at: String,
    pub chunk_count: usize,
    pub size_bytes: u64,
}

/// Handle on an index directory.
pub struct VectorIndex {
    pool: SqlitePool,
    dir: PathBuf,
    model: String,
    dims: usize,
}

impl VectorIndex {
    /// Replace the index at `dir` with a fresh one holding `entries`.
    ///
    /// All rows are written in one transaction. Fails if any embedding's
    /// length differs from `dims`.
    pub async fn build(dir: &Path, model: &str, dims: usize, entries: &[IndexEntry]) -> Result<Self> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dims) {
            bail!(
                "embedding for {} has {} dimensions, index expects {}",
                bad.chunk.metadata.source_file,
                bad.embedding.len(),
                dims
            );
        }

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory: {}", dir.display()))?;
        remove_index_files(dir)?;

        let pool = connect(&dir.join(INDEX_FILE), true).await?;
        sqlx::query(CREATE_ENTRIES).execute(&pool).await?;
        sqlx::query(CREATE_META).execute(&pool).await?;

        let mut tx = pool.begin().await?;
        for (position, entry) in entries.iter().enumerate() {
            let meta = &entry.chunk.metadata;
            sqlx::query(
                r#"
                INSERT INTO entries (position, text, source_file, file_type, document_type,
                                     page_number, chunk_id, total_chunks, chunk_type, hash, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&entry.chunk.text)
            .bind(&meta.source_file)
            .bind(meta.file_type.as_str())
            .bind(meta.document_type.as_str())
            .bind(meta.page_number.map(i64::from))
            .bind(meta.chunk_id as i64)
            .bind(meta.total_chunks as i64)
            .bind(meta.chunk_type.as_str())
            .bind(&entry.chunk.hash)
            .bind(vec_to_blob(&entry.embedding))
            .execute(&mut *tx)
            .await?;
        }

        let built_at = chrono::Utc::now().to_rfc3339();
        let dims_text = dims.to_string();
        let count_text = entries.len().to_string();
        for (key, value) in [
            ("model", model),
            ("dims", dims_text.as_str()),
            ("built_at", built_at.as_str()),
            ("chunk_count", count_text.as_str()),
        ] {
            sqlx::query("INSERT INTO meta (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(dir = %dir.display(), entries = entries.len(), "index written");

        Ok(Self {
            pool,
            dir: dir.to_path_buf(),
            model: model.to_string(),
            dims,
        })
    }

    /// Open an existing index. Fails if `dir` holds no index file.
    pub async fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            bail!("no index found at {}; run `codex ingest` first", dir.display());
        }

        let pool = connect(&path, false).await?;
        let meta = read_meta(&pool).await?;
        let model = meta
            .get("model")
            .cloned()
            .ok_or_else(|| anyhow!("index at {} has no model recorded", dir.display()))?;
        let dims = meta
            .get("dims")
            .and_then(|d| d.parse::<usize>().ok())
            .ok_or_else(|| anyhow!("index at {} has no valid dims recorded", dir.display()))?;

        Ok(Self {
            pool,
            dir: dir.to_path_buf(),
            model,
            dims,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub async fn len(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// Returns fewer than `k` when the index is smaller. Equal scores keep
    /// insertion order.
    pub async fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dims {
            bail!(
                "query vector has {} dimensions but index was built by '{}' with {}",
                query.len(),
                self.model,
                self.dims
            );
        }

        let rows = sqlx::query("SELECT * FROM entries ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let score = dot(query, &blob_to_vec(&blob));
            scored.push(ScoredChunk {
                chunk: row_to_chunk(row)?,
                score,
                position: row.get("position"),
            });
        }

        // Stable sort: rows arrive in position order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of stored chunks per category; every category is present.
    pub async fn counts_by_type(&self) -> Result<BTreeMap<DocumentType, usize>> {
        let mut counts: BTreeMap<DocumentType, usize> =
            DocumentType::ALL.into_iter().map(|t| (t, 0)).collect();

        let rows = sqlx::query(
            "SELECT chunk_type, COUNT(*) AS n FROM entries GROUP BY chunk_type",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in &rows {
            let name: String = row.get("chunk_type");
            let n: i64 = row.get("n");
            if let Some(t) = DocumentType::parse(&name) {
                counts.insert(t, n as usize);
            }
        }
        Ok(counts)
    }

    pub async fn info(&self) -> Result<IndexInfo> {
        let meta = read_meta(&self.pool).await?;
        let path = self.dir.join(INDEX_FILE);
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Ok(IndexInfo {
            model: self.model.clone(),
            dims: self.dims,
            built_at: meta.get("built_at").cloned().unwrap_or_default(),
            chunk_count: self.len().await?,
            size_bytes,
            path,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Delete `index.sqlite` and its `-wal`/`-shm` files, if present.
fn remove_index_files(dir: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let path = dir.join(format!("{}{}", INDEX_FILE, suffix));
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove old index: {}", path.display()))
            }
        }
    }
    Ok(())
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open index database: {}", path.display()))?;

    Ok(pool)
}

async fn read_meta(pool: &SqlitePool) -> Result<BTreeMap<String, String>> {
    let rows = sqlx::query("SELECT key, value FROM meta")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("key"), row.get::<String, _>("value")))
        .collect())
}

fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Result<AnnotatedChunk> {
    let file_type: String = row.get("file_type");
    let document_type: String = row.get("document_type");
    let chunk_type: String = row.get("chunk_type");
    let page_number: Option<i64> = row.get("page_number");
    let chunk_id: i64 = row.get("chunk_id");
    let total_chunks: i64 = row.get("total_chunks");

    Ok(AnnotatedChunk {
        text: row.get("text"),
        hash: row.get("hash"),
        metadata: ChunkMetadata {
            source_file: row.get("source_file"),
            file_type: DocumentFormat::parse(&file_type)
                .ok_or_else(|| anyhow!("unknown file_type in index: {}", file_type))?,
            document_type: DocumentType::parse(&document_type)
                .ok_or_else(|| anyhow!("unknown document_type in index: {}", document_type))?,
            page_number: page_number.map(|p| p as u32),
            chunk_id: chunk_id as usize,
            total_chunks: total_chunks as usize,
            chunk_type: DocumentType::parse(&chunk_type)
                .ok_or_else(|| anyhow!("unknown chunk_type in index: {}", chunk_type))?,
        },
    })
}
