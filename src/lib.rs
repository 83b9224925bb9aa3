//! # Persona Codex
//!
//! A retrieval-augmented assistant that answers questions about one person
//! in that person's own voice, grounded in their CV, project write-ups and
//! personal notes.
//!
//! Ingestion reads a flat corpus directory, cleans and classifies each
//! document, splits it with a category-specific policy, tags every chunk
//! with its category, embeds it and writes a persistent vector index.
//! At query time the question is embedded, the nearest chunks are pulled
//! from the index, and a persona template combines them with recent
//! conversation history into a single prompt for the completion model.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐  ┌────────────┐  ┌───────┐  ┌──────────┐  ┌───────┐  ┌────────┐
//! │ Loader │─▶│ Preprocess │─▶│ Chunk │─▶│ Annotate │─▶│ Embed │─▶│ Index  │
//! └────────┘  └────────────┘  └───────┘  └──────────┘  └───────┘  └───┬────┘
//!                                                                     │
//!        ┌──────────┐   ┌────────┐   ┌──────────┐   ┌───────────┐     │
//!        │ Generate │◀──│ Prompt │◀──│ Memory   │   │ Retriever │◀────┘
//!        └──────────┘   └────────┘◀──┴──────────┴───┴───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! codex ingest                          # build the index from [corpus].dir
//! codex search "technical skills" -k 3  # inspect retrieval
//! codex ask "What are your technical skills?" --mode interview
//! codex chat --mode storytelling        # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF page text extraction |
//! | [`loader`] | Corpus directory loader |
//! | [`preprocess`] | Whitespace cleanup and short-fragment filter |
//! | [`chunk`] | Type-aware recursive chunking |
//! | [`annotate`] | Category tags for chunks |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Persistent vector index |
//! | [`retriever`] | Query-time context retrieval |
//! | [`memory`] | Conversation history |
//! | [`prompt`] | Persona modes and prompt templates |
//! | [`generate`] | Completion providers |
//! | [`ingest`] | Ingestion orchestration |
//! | [`assistant`] | Question answering and sessions |
//! | [`chat`] | Terminal ask/chat front end |
//! | [`stats`] | Index statistics |

pub mod annotate;
pub mod assistant;
pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod memory;
pub mod models;
pub mod preprocess;
pub mod prompt;
pub mod retriever;
pub mod stats;
