//! Course-aware vector store over a [`VectorIndex`].
//!
//! The catalog collection holds one record per course, embedded from the
//! course title and used only to resolve loosely written course names. The
//! content collection holds one record per chunk, keyed by
//! `(course_title, chunk_index)`.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Course, CourseChunk, Lookup, SearchQuery, SearchResult};
use crate::vector_index::{Collection, IndexFilter, IndexRecord, RecordMetadata, VectorIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tutor_core::{AppError, AppResult, KnowledgeSettings};

/// Catalog record payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogPayload {
    course: Course,
    #[serde(default)]
    fingerprint: Option<String>,
}

fn content_id(course_title: &str, chunk_index: usize) -> String {
    format!("{}::{}", course_title, chunk_index)
}

/// Two-collection store for course metadata and course content.
pub struct VectorStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    max_results: usize,
    min_resolve_similarity: f32,
}

impl VectorStore {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: &KnowledgeSettings,
    ) -> Self {
        Self {
            index,
            embedder,
            max_results: settings.max_results,
            min_resolve_similarity: settings.min_resolve_similarity,
        }
    }

    /// Default result limit for content search.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    async fn catalog_record(&self, course: &Course, fingerprint: Option<&str>) -> AppResult<IndexRecord> {
        let embedding = self.embedder.embed(&course.title).await?;
        let payload = serde_json::to_value(CatalogPayload {
            course: course.clone(),
            fingerprint: fingerprint.map(str::to_string),
        })?;

        Ok(IndexRecord {
            id: course.title.clone(),
            document: course.title.clone(),
            embedding,
            metadata: RecordMetadata {
                course_title: course.title.clone(),
                payload: Some(payload),
                ..RecordMetadata::default()
            },
        })
    }

    async fn content_records(&self, chunks: &[CourseChunk]) -> AppResult<Vec<IndexRecord>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::SearchBackend(format!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexRecord {
                id: content_id(&chunk.course_title, chunk.chunk_index),
                document: chunk.content.clone(),
                embedding,
                metadata: RecordMetadata {
                    course_title: chunk.course_title.clone(),
                    lesson_number: chunk.lesson_number,
                    chunk_index: Some(chunk.chunk_index),
                    payload: None,
                },
            })
            .collect())
    }

    /// Upsert the catalog entry for a course, keyed by title.
    pub async fn add_catalog_entry(&self, course: &Course) -> AppResult<()> {
        let record = self.catalog_record(course, None).await?;
        self.index.upsert(Collection::Catalog, vec![record]).await
    }

    /// Upsert content chunks, keyed by `(course_title, chunk_index)`.
    pub async fn add_chunks(&self, chunks: &[CourseChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let records = self.content_records(chunks).await?;
        self.index.upsert(Collection::Content, records).await
    }

    /// Atomically replace a course's catalog entry and all of its chunks.
    ///
    /// Embeddings are computed before the index is touched, so a failing
    /// embedding backend leaves the previous version in place.
    pub async fn replace_course(
        &self,
        course: &Course,
        chunks: &[CourseChunk],
        fingerprint: Option<&str>,
    ) -> AppResult<()> {
        let catalog = self.catalog_record(course, fingerprint).await?;
        let content = if chunks.is_empty() {
            Vec::new()
        } else {
            self.content_records(chunks).await?
        };

        self.index
            .replace_course(&course.title, catalog, content)
            .await?;

        tracing::debug!("Indexed course '{}' ({} chunks)", course.title, chunks.len());
        Ok(())
    }

    /// Map a possibly imprecise course name to the exact stored title.
    ///
    /// Returns `None` when the catalog is empty or the nearest title is
    /// less similar than the configured bar.
    pub async fn resolve_course_name(&self, name: &str) -> AppResult<Option<String>> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        let embedding = self.embedder.embed(name).await?;
        let hits = self
            .index
            .query(Collection::Catalog, &embedding, &IndexFilter::default(), 1)
            .await?;

        let resolved = hits.into_iter().next().and_then(|hit| {
            let similarity = 1.0 - hit.distance;
            tracing::debug!(
                "Nearest course for '{}': '{}' (similarity {:.3})",
                name,
                hit.record.metadata.course_title,
                similarity
            );
            (similarity >= self.min_resolve_similarity).then_some(hit.record.metadata.course_title)
        });

        Ok(resolved)
    }

    /// Search course content with exact-match filters.
    ///
    /// Results are ascending by distance. No match is an empty result.
    pub async fn search(&self, query: &SearchQuery) -> AppResult<Vec<SearchResult>> {
        let embedding = self.embedder.embed(&query.text).await?;
        let filter = IndexFilter {
            course_title: query.filters.course_title.clone(),
            lesson_number: query.filters.lesson_number,
        };
        let limit = query.limit.unwrap_or(self.max_results);

        let hits = self
            .index
            .query(Collection::Content, &embedding, &filter, limit)
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                content: hit.record.document,
                course_title: hit.record.metadata.course_title,
                lesson_number: hit.record.metadata.lesson_number,
                distance: hit.distance,
            })
            .collect())
    }

    /// Resolve an optional course name, then search.
    ///
    /// An unresolvable name yields [`Lookup::UnknownCourse`] without searching.
    pub async fn lookup(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> AppResult<Lookup> {
        let mut search = SearchQuery::new(query);

        if let Some(name) = course_name {
            match self.resolve_course_name(name).await? {
                Some(title) => search = search.with_course(title),
                None => {
                    return Ok(Lookup::UnknownCourse {
                        requested: name.to_string(),
                    })
                }
            }
        }
        if let Some(number) = lesson_number {
            search = search.with_lesson(number);
        }

        Ok(Lookup::Hits(self.search(&search).await?))
    }

    async fn catalog_payload(&self, title: &str) -> AppResult<Option<CatalogPayload>> {
        match self.index.get(Collection::Catalog, title).await? {
            Some(record) => decode_payload(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Stored metadata for an exact course title.
    pub async fn get_course(&self, title: &str) -> AppResult<Option<Course>> {
        Ok(self.catalog_payload(title).await?.map(|p| p.course))
    }

    /// Content fingerprint recorded when the course was last indexed.
    pub async fn course_fingerprint(&self, title: &str) -> AppResult<Option<String>> {
        Ok(self.catalog_payload(title).await?.and_then(|p| p.fingerprint))
    }

    pub async fn course_link(&self, title: &str) -> AppResult<Option<String>> {
        Ok(self.get_course(title).await?.and_then(|c| c.link))
    }

    pub async fn lesson_link(&self, title: &str, lesson_number: u32) -> AppResult<Option<String>> {
        Ok(self
            .get_course(title)
            .await?
            .and_then(|c| c.lesson(lesson_number).and_then(|l| l.link.clone())))
    }

    /// Every indexed course, sorted by title.
    pub async fn all_courses(&self) -> AppResult<Vec<Course>> {
        self.index
            .list(Collection::Catalog)
            .await?
            .iter()
            .map(|record| decode_payload(record).map(|p| p.course))
            .collect()
    }

    pub async fn course_titles(&self) -> AppResult<Vec<String>> {
        Ok(self
            .index
            .list(Collection::Catalog)
            .await?
            .into_iter()
            .map(|record| record.metadata.course_title)
            .collect())
    }

    pub async fn course_count(&self) -> AppResult<usize> {
        self.index.count(Collection::Catalog).await
    }

    pub async fn chunk_count(&self) -> AppResult<usize> {
        self.index.count(Collection::Content).await
    }

    /// Remove every course and chunk.
    pub async fn clear_all(&self) -> AppResult<()> {
        self.index.clear().await
    }
}

fn decode_payload(record: &IndexRecord) -> AppResult<CatalogPayload> {
    let payload = record.metadata.payload.clone().ok_or_else(|| {
        AppError::SearchBackend(format!("catalog entry '{}' has no course data", record.id))
    })?;
    serde_json::from_value(payload).map_err(|e| {
        AppError::SearchBackend(format!("catalog entry '{}' is corrupted: {}", record.id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::memory_index::InMemoryIndex;
    use crate::types::Lesson;

    fn store() -> VectorStore {
        VectorStore::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(TrigramProvider::new(384)),
            &KnowledgeSettings::default(),
        )
    }

    fn course(title: &str) -> Course {
        Course {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title.len())),
            instructor: Some("Jane Doe".to_string()),
            lessons: vec![
                Lesson {
                    lesson_number: 1,
                    title: "One".to_string(),
                    link: Some("https://example.com/l1".to_string()),
                },
                Lesson {
                    lesson_number: 2,
                    title: "Two".to_string(),
                    link: None,
                },
            ],
        }
    }

    fn chunk(course: &str, lesson: Option<u32>, index: usize, content: &str) -> CourseChunk {
        CourseChunk {
            content: content.to_string(),
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: index,
        }
    }

    #[tokio::test]
    async fn test_resolve_on_empty_catalog_is_none() {
        let store = store();
        assert_eq!(store.resolve_course_name("Testing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_returns_exact_stored_title() {
        let store = store();
        for title in ["Intro to Testing", "Advanced Web Development"] {
            store.add_catalog_entry(&course(title)).await.unwrap();
        }

        assert_eq!(
            store.resolve_course_name("Testing").await.unwrap().as_deref(),
            Some("Intro to Testing")
        );
        assert_eq!(
            store.resolve_course_name("web").await.unwrap().as_deref(),
            Some("Advanced Web Development")
        );
        assert_eq!(store.resolve_course_name("Nonexistent").await.unwrap(), None);
        assert_eq!(store.resolve_course_name("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_chunks_is_idempotent() {
        let store = store();
        let chunks = vec![
            chunk("A", Some(1), 0, "first chunk about unit tests"),
            chunk("A", Some(1), 1, "second chunk about fixtures"),
        ];
        store.add_chunks(&chunks).await.unwrap();
        store.add_chunks(&chunks).await.unwrap();
        assert_eq!(store.chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_filters_and_ordering() {
        let store = store();
        store
            .add_chunks(&[
                chunk("A", Some(1), 0, "unit tests check small pieces"),
                chunk("A", Some(2), 1, "mocks replace collaborators in tests"),
                chunk("B", Some(2), 0, "html markup and css styling"),
            ])
            .await
            .unwrap();

        let results = store
            .search(&SearchQuery::new("mocks collaborators"))
            .await
            .unwrap();
        assert_eq!(results[0].content, "mocks replace collaborators in tests");
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }

        let results = store
            .search(&SearchQuery::new("tests").with_course("A").with_lesson(2))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lesson_number, Some(2));
        assert_eq!(results[0].course_title, "A");

        let results = store
            .search(&SearchQuery::new("tests").with_course("Nonexistent"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = store();
        let chunks: Vec<_> = (0..8)
            .map(|i| chunk("A", None, i, &format!("testing content number {}", i)))
            .collect();
        store.add_chunks(&chunks).await.unwrap();

        let default_limit = store.search(&SearchQuery::new("testing")).await.unwrap();
        assert_eq!(default_limit.len(), 5);
        let limited = store
            .search(&SearchQuery::new("testing").with_limit(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_reports_unknown_course() {
        let store = store();
        store.add_catalog_entry(&course("Intro to Testing")).await.unwrap();

        let outcome = store
            .lookup("anything", Some("Nonexistent"), None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Lookup::UnknownCourse {
                requested: "Nonexistent".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_replace_course_is_not_append() {
        let store = store();
        let c = course("Intro to Testing");
        let first: Vec<_> = (0..3)
            .map(|i| chunk(&c.title, Some(1), i, &format!("old text {}", i)))
            .collect();
        store.replace_course(&c, &first, Some("v1")).await.unwrap();

        let second = vec![chunk(&c.title, Some(1), 0, "new text")];
        store.replace_course(&c, &second, Some("v2")).await.unwrap();

        assert_eq!(store.course_count().await.unwrap(), 1);
        assert_eq!(store.chunk_count().await.unwrap(), 1);
        assert_eq!(
            store.course_fingerprint(&c.title).await.unwrap().as_deref(),
            Some("v2")
        );
    }

    #[tokio::test]
    async fn test_course_metadata_lookups() {
        let store = store();
        store.add_catalog_entry(&course("Intro to Testing")).await.unwrap();
        store.add_catalog_entry(&course("Advanced Web Development")).await.unwrap();

        let title = "Intro to Testing";
        assert_eq!(store.get_course(title).await.unwrap().unwrap().lessons.len(), 2);
        assert!(store.course_link(title).await.unwrap().is_some());
        assert_eq!(
            store.lesson_link(title, 1).await.unwrap().as_deref(),
            Some("https://example.com/l1")
        );
        assert_eq!(store.lesson_link(title, 2).await.unwrap(), None);
        assert_eq!(store.get_course("Missing").await.unwrap(), None);
        assert_eq!(
            store.course_titles().await.unwrap(),
            vec!["Advanced Web Development", "Intro to Testing"]
        );

        store.clear_all().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
    }
}
