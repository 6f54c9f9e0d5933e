//! Course knowledge base and tool-orchestrated question answering.
//!
//! Transcripts are parsed into courses and sentence-aligned chunks, embedded
//! and stored in two collections: a course catalog used to resolve loosely
//! written course names, and the chunk content itself. Questions are
//! answered by a language model that decides on its own whether to call the
//! search and outline tools.

pub mod chunker;
pub mod document;
pub mod embeddings;
pub mod memory_index;
pub mod rag;
pub mod types;
pub mod vector_index;
pub mod vector_store;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use document::{DocumentProcessor, ProcessedDocument};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use memory_index::InMemoryIndex;
pub use rag::{DocumentStatus, QueryResponse, RagSystem, SessionManager, Source};
pub use types::{
    Course, CourseCatalog, CourseChunk, CourseSummary, IngestStats, Lesson, Lookup, RawDocument,
    SearchFilters, SearchQuery, SearchResult,
};
pub use vector_index::{Collection, IndexFilter, IndexHit, IndexRecord, VectorIndex};
pub use vector_store::VectorStore;
