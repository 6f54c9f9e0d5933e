//! `get_course_outline`: course metadata and lesson list.

use crate::rag::tools::{Tool, ToolOutput};
use crate::types::Course;
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tutor_core::{AppError, AppResult};
use tutor_llm::ToolDefinition;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutlineParams {
    course_name: String,
}

pub struct CourseOutlineTool {
    store: Arc<VectorStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }
}

fn format_outline(course: &Course) -> String {
    let mut lines = vec![
        format!("Course: {}", course.title),
        format!(
            "Instructor: {}",
            course.instructor.as_deref().unwrap_or("Unknown Instructor")
        ),
        format!(
            "Course Link: {}",
            course.link.as_deref().unwrap_or("No link available")
        ),
        format!("Total Lessons: {}", course.lesson_count()),
        String::new(),
        "Lesson Outline:".to_string(),
    ];

    let mut lessons: Vec<_> = course.lessons.iter().collect();
    lessons.sort_by_key(|lesson| lesson.lesson_number);

    if lessons.is_empty() {
        lines.push("  No lessons available".to_string());
    }
    for lesson in lessons {
        lines.push(format!("  {}. {}", lesson.lesson_number, lesson.title));
        if let Some(link) = &lesson.link {
            lines.push(format!("     Link: {}", link));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the complete outline and lesson structure for a specific course"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title or partial course name to get outline for (e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let params: OutlineParams = serde_json::from_value(input.clone()).map_err(|e| {
            AppError::Generation(format!(
                "Invalid parameters for {}: {}",
                OUTLINE_TOOL_NAME, e
            ))
        })?;

        let name = params.course_name.trim();
        if name.is_empty() {
            return Ok(ToolOutput::text(
                "Course name is required to get course outline.",
            ));
        }

        let Some(title) = self.store.resolve_course_name(name).await? else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'. Please check the course name and try again.",
                name
            )));
        };

        match self.store.get_course(&title).await? {
            Some(course) => Ok(ToolOutput::text(format_outline(&course))),
            None => Ok(ToolOutput::text(format!(
                "Course metadata not found for '{}'.",
                title
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::memory_index::InMemoryIndex;
    use crate::types::Lesson;
    use tutor_core::KnowledgeSettings;

    fn lesson(n: u32, title: &str, link: Option<&str>) -> Lesson {
        Lesson {
            lesson_number: n,
            title: title.to_string(),
            link: link.map(str::to_string),
        }
    }

    async fn tool_with(course: Course) -> CourseOutlineTool {
        let store = VectorStore::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(TrigramProvider::new(384)),
            &KnowledgeSettings::default(),
        );
        store.add_catalog_entry(&course).await.unwrap();
        CourseOutlineTool::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_outline_lists_lessons_in_order() {
        let course = Course {
            title: "Intro to Testing".to_string(),
            link: Some("https://example.com/testing".to_string()),
            instructor: Some("Jane Doe".to_string()),
            lessons: vec![
                lesson(2, "Mocks", Some("https://example.com/testing/2")),
                lesson(0, "Welcome", None),
                lesson(1, "Unit tests", Some("https://example.com/testing/1")),
            ],
        };
        let tool = tool_with(course).await;

        let output = tool
            .execute(&json!({ "course_name": "testing" }))
            .await
            .unwrap();

        let expected = "Course: Intro to Testing\n\
                        Instructor: Jane Doe\n\
                        Course Link: https://example.com/testing\n\
                        Total Lessons: 3\n\
                        \n\
                        Lesson Outline:\n  \
                        0. Welcome\n  \
                        1. Unit tests\n     \
                        Link: https://example.com/testing/1\n  \
                        2. Mocks\n     \
                        Link: https://example.com/testing/2";
        assert_eq!(output.text, expected);
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_outline_defaults_for_missing_metadata() {
        let tool = tool_with(Course::new("Intro to Testing")).await;
        let output = tool
            .execute(&json!({ "course_name": "Intro to Testing" }))
            .await
            .unwrap();

        assert!(output.text.contains("Instructor: Unknown Instructor"));
        assert!(output.text.contains("Course Link: No link available"));
        assert!(output.text.ends_with("  No lessons available"));
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let tool = tool_with(Course::new("Intro to Testing")).await;
        let output = tool
            .execute(&json!({ "course_name": "Nonexistent" }))
            .await
            .unwrap();
        assert!(output.text.starts_with("No course found matching 'Nonexistent'"));
    }

    #[tokio::test]
    async fn test_outline_requires_course_name() {
        let tool = tool_with(Course::new("Intro to Testing")).await;

        let output = tool.execute(&json!({ "course_name": "" })).await.unwrap();
        assert_eq!(output.text, "Course name is required to get course outline.");

        let err = tool.execute(&json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
