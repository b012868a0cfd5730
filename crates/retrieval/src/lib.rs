//! Role-filtered document retrieval.
//!
//! The pipeline runs in two phases. Ingestion walks the per-department
//! data directories, cuts files into overlapping chunks and embeds
//! them into a SQLite-backed vector index. Querying resolves the
//! caller's role into a set of accessible departments, searches only
//! inside that set and hands the retrieved context to a generation
//! model.

pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod processor;
pub mod tabular;
pub mod types;


pub use embeddings::{create_embedder, EmbeddingProvider, HashEmbedder, OllamaEmbedder};
pub use engine::{RagEngine, NO_RESULTS_MARKER};
pub use index::VectorIndex;
pub use processor::{DocumentProcessor, ProcessorSummary};
pub use types::{
    Answer, DocumentChunk, IndexStats, PermissionsReport, RebuildReport, SearchResult,
    SourceFormat, SourceRef, SystemStats,
};
