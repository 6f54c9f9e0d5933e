//! End-to-end turns: ingest transcripts, then answer with a scripted model.

use super::support::{tool_call_response, ScriptedLlmClient, UnreachableIndex};
use crate::embeddings::providers::TrigramProvider;
use crate::memory_index::InMemoryIndex;
use crate::rag::{DocumentStatus, RagSystem};
use crate::types::RawDocument;
use crate::vector_index::{Collection, VectorIndex};
use serde_json::json;
use std::sync::Arc;
use tutor_core::{AppConfig, AppError};
use tutor_llm::{ContentBlock, LlmResponse};

const TESTING_COURSE: &str = "Course Title: Intro to Testing
Course Link: https://example.com/testing
Course Instructor: Jane Doe

Lesson 1: Unit Tests
Lesson Link: https://example.com/testing/1
Unit tests check a single function in isolation.
Assertions compare actual values with expected ones.
Test runners discover and execute every test case.
Lesson 2: Test Doubles
Lesson Link: https://example.com/testing/2
Mocks replace slow collaborators such as databases.
Stubs return canned answers to the code under test.
Fixtures prepare shared state before each test runs.
";

const WEB_COURSE: &str = "Course Title: Advanced Web Development
Course Link: https://example.com/web
Course Instructor: John Smith

Lesson 0: Introduction
Browsers render markup into a tree of document nodes.
Lesson 1: Styling
Cascading style sheets decide how every element looks.
";

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.provider = "ollama".to_string();
    // One sentence per chunk for the fixtures above
    config.knowledge.chunk_size = 60;
    config.knowledge.chunk_overlap = 0;
    config
}

fn system_with(client: Arc<ScriptedLlmClient>, index: Arc<dyn VectorIndex>) -> RagSystem {
    let prompt = tutor_prompt::builtin_prompt("course.assistant").unwrap();
    RagSystem::with_components(
        &config(),
        client,
        Arc::new(TrigramProvider::new(384)),
        index,
        prompt,
    )
    .unwrap()
}

async fn seeded(client: Arc<ScriptedLlmClient>) -> (RagSystem, Arc<InMemoryIndex>) {
    let index = Arc::new(InMemoryIndex::new());
    let system = system_with(client, index.clone());
    for (id, text) in [("testing.txt", TESTING_COURSE), ("web.txt", WEB_COURSE)] {
        system
            .ingest_document(&RawDocument::new(id, text))
            .await
            .unwrap();
    }
    (system, index)
}

fn answer(text: &str) -> LlmResponse {
    LlmResponse::from_text(text, "scripted")
}

fn last_tool_result(client: &ScriptedLlmClient) -> String {
    let requests = client.requests();
    let last = requests.last().unwrap();
    last.messages
        .last()
        .unwrap()
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::ToolResult { content, .. } => Some(content.clone()),
            _ => None,
        })
        .unwrap()
}

#[tokio::test]
async fn test_lesson_filter_returns_only_that_lessons_sources() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        tool_call_response(&[(
            "call_1",
            "search_course_content",
            json!({
                "query": "what is covered in lesson 2",
                "course_name": "Testing",
                "lesson_number": 2
            }),
        )]),
        answer("Lesson 2 covers test doubles."),
    ]));
    let (system, _) = seeded(client.clone()).await;

    let response = system.query("What is covered in lesson 2?", None).await.unwrap();

    assert_eq!(response.answer, "Lesson 2 covers test doubles.");
    assert_eq!(response.sources.len(), 3);
    for source in &response.sources {
        assert_eq!(source.text, "Intro to Testing - Lesson 2");
        assert_eq!(source.link.as_deref(), Some("https://example.com/testing/2"));
    }

    let tool_text = last_tool_result(&client);
    assert!(tool_text.contains("Mocks replace slow collaborators"));
    assert!(!tool_text.contains("Lesson 1]"));
}

#[tokio::test]
async fn test_follow_up_sees_previous_exchange() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        answer("Mocks replace collaborators."),
        answer("Stubs return canned answers."),
    ]));
    let (system, _) = seeded(client.clone()).await;

    let first = system.query("What are mocks?", None).await.unwrap();
    let second = system
        .query("And stubs?", Some(&first.session_id))
        .await
        .unwrap();
    assert_eq!(second.session_id, first.session_id);

    let requests = client.requests();
    let first_system = requests[0].system.as_deref().unwrap();
    assert!(!first_system.contains("Previous conversation"));
    let second_system = requests[1].system.as_deref().unwrap();
    assert!(second_system.contains(
        "Previous conversation:\nUser: What are mocks?\nAssistant: Mocks replace collaborators."
    ));
}

#[tokio::test]
async fn test_unknown_course_is_answered_not_failed() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        tool_call_response(&[(
            "call_1",
            "search_course_content",
            json!({ "query": "intro", "course_name": "Nonexistent" }),
        )]),
        answer("There is no course called Nonexistent."),
    ]));
    let (system, _) = seeded(client.clone()).await;

    let response = system.query("What does Nonexistent cover?", None).await.unwrap();

    assert_eq!(response.answer, "There is no course called Nonexistent.");
    assert!(response.sources.is_empty());
    assert_eq!(
        last_tool_result(&client),
        "No course found matching 'Nonexistent'"
    );
}

#[tokio::test]
async fn test_sources_from_two_calls_then_reset() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        tool_call_response(&[
            (
                "call_1",
                "search_course_content",
                json!({ "query": "tests", "course_name": "Testing", "lesson_number": 1 }),
            ),
            (
                "call_2",
                "search_course_content",
                json!({ "query": "styling", "course_name": "Web", "lesson_number": 1 }),
            ),
        ]),
        answer("Both courses touch on it."),
        answer("Hello!"),
    ]));
    let (system, _) = seeded(client.clone()).await;

    let response = system.query("Compare lesson 1 of both", None).await.unwrap();
    let labels: Vec<_> = response.sources.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Intro to Testing - Lesson 1",
            "Intro to Testing - Lesson 1",
            "Intro to Testing - Lesson 1",
            "Advanced Web Development - Lesson 1",
        ]
    );
    // Web lesson 1 has no link of its own
    assert_eq!(
        response.sources[3].link.as_deref(),
        Some("https://example.com/web")
    );

    let next = system.query("Hi", Some(&response.session_id)).await.unwrap();
    assert!(next.sources.is_empty());
}

#[tokio::test]
async fn test_outline_then_search_across_rounds() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        tool_call_response(&[(
            "call_1",
            "get_course_outline",
            json!({ "course_name": "web development" }),
        )]),
        tool_call_response(&[(
            "call_2",
            "search_course_content",
            json!({ "query": "browsers markup", "course_name": "web development", "lesson_number": 0 }),
        )]),
        answer("Lesson 0 introduces rendering."),
    ]));
    let (system, _) = seeded(client.clone()).await;

    let response = system.query("Outline then details", None).await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].offers_tools());
    assert!(!requests[2].offers_tools());
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, "Advanced Web Development - Lesson 0");
}

#[tokio::test]
async fn test_backend_failure_fails_turn_and_keeps_history() {
    let client = Arc::new(ScriptedLlmClient::new(vec![
        answer("Hello there."),
        tool_call_response(&[(
            "call_1",
            "search_course_content",
            json!({ "query": "mocks" }),
        )]),
    ]));
    let system = system_with(client, Arc::new(UnreachableIndex));

    let first = system.query("Hi", None).await.unwrap();
    let before = system.sessions().messages(&first.session_id).unwrap();

    let err = system
        .query("What are mocks?", Some(&first.session_id))
        .await
        .unwrap_err();
    match err {
        AppError::Generation(msg) => assert!(msg.contains("index unreachable")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(system.sessions().messages(&first.session_id).unwrap(), before);
}

#[tokio::test]
async fn test_malformed_tool_call_fails_turn() {
    let client = Arc::new(ScriptedLlmClient::new(vec![tool_call_response(&[(
        "call_1",
        "search_course_content",
        json!({ "query": "mocks", "lesson_number": "two" }),
    )])]));
    let (system, _) = seeded(client).await;

    let err = system.query("What are mocks?", None).await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
    assert_eq!(system.sessions().session_count().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_first_turn_registers_no_session() {
    let client = Arc::new(ScriptedLlmClient::new(vec![answer("Mocks replace collaborators.")]));
    let (system, _) = seeded(client).await;

    // Empty script after the first answer: the second turn fails
    let first = system.query("What are mocks?", None).await.unwrap();
    assert!(system.query("And stubs?", None).await.is_err());

    assert_eq!(system.sessions().session_count().unwrap(), 1);
    assert!(system.sessions().get_history(&first.session_id).unwrap().is_some());
}

#[tokio::test]
async fn test_history_window_is_bounded() {
    let client = Arc::new(ScriptedLlmClient::repeating(answer("ok")));
    let (system, _) = seeded(client).await;

    let session = system.query("q1", None).await.unwrap().session_id;
    for q in ["q2", "q3", "q4"] {
        system.query(q, Some(&session)).await.unwrap();
    }

    let history = system.sessions().get_history(&session).unwrap().unwrap();
    assert_eq!(history, "User: q3\nAssistant: ok\nUser: q4\nAssistant: ok");
}

#[tokio::test]
async fn test_reingest_is_replace_not_append() {
    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let (system, index) = seeded(client).await;

    let before = index.list(Collection::Content).await.unwrap();
    assert_eq!(before.len(), 8);

    let status = system
        .ingest_document(&RawDocument::new("testing.txt", TESTING_COURSE))
        .await
        .unwrap();
    assert_eq!(
        status,
        DocumentStatus::Unchanged {
            course_title: "Intro to Testing".to_string()
        }
    );
    assert_eq!(index.list(Collection::Content).await.unwrap(), before);

    // Same title, one lesson dropped
    let shorter = TESTING_COURSE
        .split("Lesson 2:")
        .next()
        .unwrap()
        .to_string();
    let status = system
        .ingest_document(&RawDocument::new("testing.txt", shorter))
        .await
        .unwrap();
    assert_eq!(
        status,
        DocumentStatus::Indexed {
            course_title: "Intro to Testing".to_string(),
            chunks: 3
        }
    );
    assert_eq!(system.store().chunk_count().await.unwrap(), 5);
    assert_eq!(system.store().course_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_chunk_indices_increase_across_lessons() {
    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let (_system, index) = seeded(client).await;

    let mut indices: Vec<(Option<u32>, usize)> = index
        .list(Collection::Content)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.metadata.course_title == "Intro to Testing")
        .map(|r| (r.metadata.lesson_number, r.metadata.chunk_index.unwrap()))
        .collect();
    indices.sort_by_key(|(_, i)| *i);

    assert_eq!(
        indices,
        vec![
            (Some(1), 0),
            (Some(1), 1),
            (Some(1), 2),
            (Some(2), 3),
            (Some(2), 4),
            (Some(2), 5),
        ]
    );
}

#[tokio::test]
async fn test_catalog_lists_courses_with_lesson_counts() {
    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let (system, _) = seeded(client).await;

    let catalog = system.catalog().await.unwrap();
    assert_eq!(catalog.total_courses, 2);
    let summary: Vec<_> = catalog
        .courses
        .iter()
        .map(|c| (c.title.as_str(), c.lesson_count, c.instructor.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Advanced Web Development", 2, Some("John Smith")),
            ("Intro to Testing", 2, Some("Jane Doe")),
        ]
    );
}

#[tokio::test]
async fn test_folder_ingest_skips_unchanged_and_replaces_edited() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("testing.txt"), TESTING_COURSE).unwrap();
    std::fs::write(dir.path().join("web.md"), WEB_COURSE).unwrap();
    std::fs::write(dir.path().join("empty.txt"), "  \n").unwrap();
    std::fs::write(dir.path().join("slides.pdf"), "binary").unwrap();

    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let system = system_with(client, Arc::new(InMemoryIndex::new()));

    let stats = system.ingest_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.courses_added, 2);
    assert_eq!(stats.courses_skipped, 0);
    assert_eq!(stats.documents_failed, 1);
    assert_eq!(stats.chunks_added, 8);

    let stats = system.ingest_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.courses_added, 0);
    assert_eq!(stats.courses_skipped, 2);

    let edited = WEB_COURSE.replace("every element looks", "each element looks");
    std::fs::write(dir.path().join("web.md"), edited).unwrap();
    let stats = system.ingest_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.courses_added, 1);
    assert_eq!(stats.courses_skipped, 1);
    assert_eq!(system.store().chunk_count().await.unwrap(), 8);

    let stats = system.ingest_folder(dir.path(), true).await.unwrap();
    assert_eq!(stats.courses_added, 2);
    assert_eq!(system.store().course_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_folder_ingest_keeps_first_file_for_duplicate_title() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), TESTING_COURSE).unwrap();
    let rewritten = TESTING_COURSE.replace("Lesson 2:", "Lesson 3:");
    std::fs::write(dir.path().join("b.txt"), rewritten).unwrap();

    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let system = system_with(client, Arc::new(InMemoryIndex::new()));

    let stats = system.ingest_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.courses_added, 1);
    assert_eq!(stats.courses_skipped, 1);
    assert_eq!(stats.chunks_added, 6);

    let stats = system.ingest_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.courses_added, 0);
    assert_eq!(stats.courses_skipped, 2);
    assert_eq!(stats.chunks_added, 0);

    let course = system.store().get_course("Intro to Testing").await.unwrap().unwrap();
    let numbers: Vec<u32> = course.lessons.iter().map(|l| l.lesson_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn test_missing_folder_is_ingest_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let system = system_with(client, Arc::new(InMemoryIndex::new()));

    let err = system
        .ingest_folder(&dir.path().join("missing"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Ingest(_)));
}
