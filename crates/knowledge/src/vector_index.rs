//! Vector index abstraction for the course collections.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval. The
//! index holds two logical collections: the course catalog (one record per
//! course, used for name resolution) and course content (one record per
//! chunk).

use serde::{Deserialize, Serialize};
use tutor_core::AppResult;

/// Logical collection within the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Catalog,
    Content,
}

/// Metadata stored beside each vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Owning course title; exact-match filter key in both collections
    pub course_title: String,

    /// Lesson number (content records only)
    #[serde(default)]
    pub lesson_number: Option<u32>,

    /// Chunk position (content records only)
    #[serde(default)]
    pub chunk_index: Option<usize>,

    /// Opaque payload (the serialized course for catalog records)
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// A stored document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Unique id within its collection; upserts replace by id
    pub id: String,

    /// Text the embedding was computed from
    pub document: String,

    pub embedding: Vec<f32>,

    pub metadata: RecordMetadata,
}

/// Exact-match filters; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl IndexFilter {
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        self.course_title
            .as_ref()
            .map_or(true, |title| *title == metadata.course_title)
            && self
                .lesson_number
                .map_or(true, |n| metadata.lesson_number == Some(n))
    }
}

/// A nearest-neighbor hit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub record: IndexRecord,

    /// Cosine distance (1 - cosine similarity); lower is closer
    pub distance: f32,
}

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Upserting records by id
/// - Filtered nearest-neighbor search (ascending distance)
/// - Atomic per-course replacement across both collections
/// - Counting and clearing
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records (by id) in a collection.
    async fn upsert(&self, collection: Collection, records: Vec<IndexRecord>) -> AppResult<()>;

    /// Return up to `top_k` records matching `filter`, nearest first.
    ///
    /// No match is an empty result, never an error.
    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        filter: &IndexFilter,
        top_k: usize,
    ) -> AppResult<Vec<IndexHit>>;

    /// Fetch a record by id.
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<IndexRecord>>;

    /// All records of a collection, ordered by id.
    async fn list(&self, collection: Collection) -> AppResult<Vec<IndexRecord>>;

    /// Delete every record of `course_title` from both collections, then
    /// insert the new catalog record and content records.
    ///
    /// Readers never observe a state between the delete and the insert.
    async fn replace_course(
        &self,
        course_title: &str,
        catalog: IndexRecord,
        content: Vec<IndexRecord>,
    ) -> AppResult<()>;

    /// Number of records in a collection.
    async fn count(&self, collection: Collection) -> AppResult<usize>;

    /// Remove all records from both collections.
    async fn clear(&self) -> AppResult<()>;
}
