//! In-memory [`VectorIndex`] implementation.
//!
//! Both collections live behind one `std::sync::RwLock`, so a course
//! replacement is a single write and readers see either the old or the new
//! course. Search is brute-force cosine similarity over the filtered records.

use crate::vector_index::{Collection, IndexFilter, IndexHit, IndexRecord, VectorIndex};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tutor_core::{AppError, AppResult};

#[derive(Default)]
struct Collections {
    catalog: BTreeMap<String, IndexRecord>,
    content: BTreeMap<String, IndexRecord>,
}

impl Collections {
    fn get(&self, collection: Collection) -> &BTreeMap<String, IndexRecord> {
        match collection {
            Collection::Catalog => &self.catalog,
            Collection::Content => &self.content,
        }
    }

    fn get_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, IndexRecord> {
        match collection {
            Collection::Catalog => &mut self.catalog,
            Collection::Content => &mut self.content,
        }
    }
}

/// Process-lifetime vector index.
#[derive(Default)]
pub struct InMemoryIndex {
    inner: RwLock<Collections>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| AppError::SearchBackend("index lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| AppError::SearchBackend("index lock poisoned".to_string()))
    }
}

pub(crate) fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, collection: Collection, records: Vec<IndexRecord>) -> AppResult<()> {
        let mut guard = self.write()?;
        let target = guard.get_mut(collection);
        for record in records {
            target.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        filter: &IndexFilter,
        top_k: usize,
    ) -> AppResult<Vec<IndexHit>> {
        let guard = self.read()?;

        let mut hits = Vec::new();
        for record in guard.get(collection).values() {
            if !filter.matches(&record.metadata) {
                continue;
            }
            if record.embedding.len() != embedding.len() {
                return Err(AppError::SearchBackend(format!(
                    "embedding dimension mismatch for '{}': stored {}, query {}",
                    record.id,
                    record.embedding.len(),
                    embedding.len()
                )));
            }
            hits.push(IndexHit {
                record: record.clone(),
                distance: 1.0 - cosine_sim(embedding, &record.embedding),
            });
        }

        // Ties keep id order (the map is sorted), so results are deterministic
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<IndexRecord>> {
        Ok(self.read()?.get(collection).get(id).cloned())
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<IndexRecord>> {
        Ok(self.read()?.get(collection).values().cloned().collect())
    }

    async fn replace_course(
        &self,
        course_title: &str,
        catalog: IndexRecord,
        content: Vec<IndexRecord>,
    ) -> AppResult<()> {
        let mut guard = self.write()?;

        guard
            .catalog
            .retain(|_, record| record.metadata.course_title != course_title);
        guard
            .content
            .retain(|_, record| record.metadata.course_title != course_title);

        guard.catalog.insert(catalog.id.clone(), catalog);
        for record in content {
            guard.content.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn count(&self, collection: Collection) -> AppResult<usize> {
        Ok(self.read()?.get(collection).len())
    }

    async fn clear(&self) -> AppResult<()> {
        let mut guard = self.write()?;
        guard.catalog.clear();
        guard.content.clear();
        Ok(())
    }
}
