//! `search_course_content`: semantic search over lesson transcripts.

use crate::rag::tools::{Tool, ToolOutput};
use crate::rag::types::Source;
use crate::types::{Course, Lookup, SearchResult};
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tutor_core::{AppError, AppResult};
use tutor_llm::ToolDefinition;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchParams {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course content, resolving loose course names first.
pub struct CourseSearchTool {
    store: Arc<VectorStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    async fn format_hits(&self, hits: Vec<SearchResult>) -> AppResult<ToolOutput> {
        // One catalog read per course in the result set
        let mut courses: HashMap<String, Option<Course>> = HashMap::new();
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());

        for hit in hits {
            if !courses.contains_key(&hit.course_title) {
                let course = self.store.get_course(&hit.course_title).await?;
                courses.insert(hit.course_title.clone(), course);
            }
            let course = courses.get(&hit.course_title).and_then(Option::as_ref);

            let label = match hit.lesson_number {
                Some(n) => format!("{} - Lesson {}", hit.course_title, n),
                None => hit.course_title.clone(),
            };
            let lesson_link = hit
                .lesson_number
                .and_then(|n| course.and_then(|c| c.lesson(n)))
                .and_then(|lesson| lesson.link.clone());
            let link = lesson_link.or_else(|| course.and_then(|c| c.link.clone()));

            blocks.push(format!("[{}]\n{}", label, hit.content));
            sources.push(Source::new(label, link));
        }

        Ok(ToolOutput::with_sources(blocks.join("\n\n"), sources))
    }
}

fn no_content_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(name) = course_name {
        message.push_str(&format!(" in course '{}'", name));
    }
    if let Some(n) = lesson_number {
        message.push_str(&format!(" in lesson {}", n));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let params: SearchParams = serde_json::from_value(input.clone()).map_err(|e| {
            AppError::Generation(format!(
                "Invalid parameters for {}: {}",
                SEARCH_TOOL_NAME, e
            ))
        })?;
        let course_name = params
            .course_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let lookup = self
            .store
            .lookup(&params.query, course_name, params.lesson_number)
            .await?;

        match lookup {
            Lookup::UnknownCourse { requested } => {
                tracing::debug!("No course matches '{}'", requested);
                Ok(ToolOutput::text(format!(
                    "No course found matching '{}'",
                    requested
                )))
            }
            Lookup::Hits(hits) if hits.is_empty() => Ok(ToolOutput::text(no_content_message(
                course_name,
                params.lesson_number,
            ))),
            Lookup::Hits(hits) => {
                tracing::debug!("Search for '{}' returned {} chunks", params.query, hits.len());
                self.format_hits(hits).await
            }
        }
    }
}
