//! Course knowledge type definitions.

use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as written in the transcript marker
    pub lesson_number: u32,

    /// Lesson title
    pub title: String,

    /// Optional link to the lesson
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A course and its lessons. The title is the natural unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    /// Lessons in document order
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Create a course with no optional metadata.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Find a lesson by number.
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons
            .iter()
            .find(|lesson| lesson.lesson_number == lesson_number)
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }
}

/// A bounded slice of lesson text with course/lesson attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Chunk text
    pub content: String,

    /// Title of the owning course (join key with the catalog)
    pub course_title: String,

    /// Lesson the text came from, if any
    pub lesson_number: Option<u32>,

    /// Position within the whole course, strictly increasing from 0
    pub chunk_index: usize,
}

/// A raw transcript handed to the ingest boundary.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Identifier for logging (usually the file path)
    pub id: String,

    /// Full document text
    pub text: String,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Exact-match metadata filters for content search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Exact stored course title (already resolved)
    pub course_title: Option<String>,

    /// Exact lesson number
    pub lesson_number: Option<u32>,
}

/// A content search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text query
    pub text: String,

    /// Metadata filters
    pub filters: SearchFilters,

    /// Result limit; the store default applies when `None`
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: SearchFilters::default(),
            limit: None,
        }
    }

    pub fn with_course(mut self, course_title: impl Into<String>) -> Self {
        self.filters.course_title = Some(course_title.into());
        self
    }

    pub fn with_lesson(mut self, lesson_number: u32) -> Self {
        self.filters.lesson_number = Some(lesson_number);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One content search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,

    /// Cosine distance; lower is more relevant
    pub distance: f32,
}

/// Outcome of a search that may name a course.
///
/// An unresolvable course name is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Search ran; hits may be empty
    Hits(Vec<SearchResult>),

    /// The requested course name matched nothing in the catalog
    UnknownCourse { requested: String },
}

/// Per-course line of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    pub lesson_count: usize,
}

/// Read-only listing of indexed courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseCatalog {
    pub total_courses: usize,
    pub courses: Vec<CourseSummary>,
}

/// Statistics from a folder ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Courses indexed (new or changed)
    pub courses_added: usize,

    /// Courses skipped because their content was already indexed
    pub courses_skipped: usize,

    /// Documents that could not be read or parsed
    pub documents_failed: usize,

    /// Chunks written for the added courses
    pub chunks_added: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_lesson_lookup() {
        let mut course = Course::new("Intro to Testing");
        course.lessons.push(Lesson {
            lesson_number: 2,
            title: "Mocks".to_string(),
            link: None,
        });

        assert_eq!(course.lesson(2).map(|l| l.title.as_str()), Some("Mocks"));
        assert!(course.lesson(1).is_none());
        assert_eq!(course.lesson_count(), 1);
    }

    #[test]
    fn test_course_roundtrips_through_json() {
        let course = Course {
            title: "Advanced Web Development".to_string(),
            link: Some("https://example.com/web".to_string()),
            instructor: None,
            lessons: vec![Lesson {
                lesson_number: 0,
                title: "Setup".to_string(),
                link: Some("https://example.com/web/0".to_string()),
            }],
        };

        let value = serde_json::to_value(&course).unwrap();
        assert!(value.get("instructor").is_none());
        let back: Course = serde_json::from_value(value).unwrap();
        assert_eq!(back, course);
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("mocking")
            .with_course("Intro to Testing")
            .with_lesson(2)
            .with_limit(3);
        assert_eq!(query.filters.course_title.as_deref(), Some("Intro to Testing"));
        assert_eq!(query.filters.lesson_number, Some(2));
        assert_eq!(query.limit, Some(3));
    }
}
