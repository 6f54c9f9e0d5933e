//! Course transcript parsing.
//!
//! A transcript starts with a header:
//!
//! ```text
//! Course Title: <title>
//! Course Link: <url>
//! Course Instructor: <name>
//! ```
//!
//! followed by lesson markers (`Lesson <n>: <title>`), each optionally
//! followed by a `Lesson Link: <url>` line. Header keys match
//! case-insensitively; link and instructor are optional.

use crate::chunker::chunk_text;
use crate::types::{Course, CourseChunk, Lesson, RawDocument};
use sha2::{Digest, Sha256};
use tutor_core::{AppError, AppResult};

/// Header lines (after the title) searched for link and instructor.
const HEADER_SCAN_LINES: usize = 3;

/// A parsed document: course metadata and its ordered chunks.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,

    /// SHA-256 of the raw document text
    pub fingerprint: String,
}

/// Turns raw transcripts into courses and chunks.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Parse a transcript into a course and its chunks.
    ///
    /// `chunk_index` runs across the whole course, not per lesson. Text
    /// before the first lesson marker is chunked with no lesson number.
    ///
    /// # Errors
    /// Returns `AppError::Ingest` when no course title can be determined.
    pub fn process(&self, document: &RawDocument) -> AppResult<ProcessedDocument> {
        let mut lines = document.text.lines().peekable();

        // Title: first non-blank line, with or without the key
        let first = loop {
            match lines.next() {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line.trim(),
                None => {
                    return Err(AppError::Ingest(format!(
                        "{}: document is empty",
                        document.id
                    )))
                }
            }
        };
        let title = header_value(first, &["course title"])
            .unwrap_or(first)
            .trim()
            .to_string();
        if title.is_empty() {
            return Err(AppError::Ingest(format!(
                "{}: missing course title",
                document.id
            )));
        }

        let mut course = Course::new(title);
        let mut segments: Vec<(Option<u32>, String)> = Vec::new();
        let mut current: Option<u32> = None;
        let mut buffer = String::new();
        let mut header_lines = 0;

        while let Some(line) = lines.next() {
            let trimmed = line.trim();

            if current.is_none() && segments.is_empty() && header_lines < HEADER_SCAN_LINES {
                header_lines += 1;
                if let Some(link) = header_value(trimmed, &["course link"]) {
                    course.link = non_empty(link);
                    continue;
                }
                if let Some(name) = header_value(trimmed, &["course instructor", "instructor"]) {
                    course.instructor = non_empty(name);
                    continue;
                }
            }

            if let Some((number, lesson_title)) = parse_lesson_marker(trimmed) {
                flush_segment(&mut segments, current, &mut buffer);
                current = Some(number);

                let link = match lines.peek() {
                    Some(next) => header_value(next.trim(), &["lesson link"]).and_then(non_empty),
                    None => None,
                };
                if link.is_some() {
                    lines.next();
                }

                if course.lesson(number).is_none() {
                    course.lessons.push(Lesson {
                        lesson_number: number,
                        title: lesson_title,
                        link,
                    });
                }
                continue;
            }

            buffer.push_str(line);
            buffer.push('\n');
        }
        flush_segment(&mut segments, current, &mut buffer);

        let mut chunks = Vec::new();
        for (lesson_number, text) in segments {
            for content in chunk_text(&text, self.chunk_size, self.chunk_overlap) {
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number,
                    chunk_index: chunks.len(),
                });
            }
        }

        tracing::debug!(
            "Processed '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );

        Ok(ProcessedDocument {
            course,
            chunks,
            fingerprint: fingerprint(&document.text),
        })
    }
}

/// SHA-256 content fingerprint, hex encoded.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn flush_segment(segments: &mut Vec<(Option<u32>, String)>, lesson: Option<u32>, buffer: &mut String) {
    if !buffer.trim().is_empty() {
        segments.push((lesson, std::mem::take(buffer)));
    } else {
        buffer.clear();
    }
}

/// Value after `<key>:` when the line starts with one of `keys` (any case).
fn header_value<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    keys.iter()
        .any(|k| key.eq_ignore_ascii_case(k))
        .then(|| value.trim())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse `Lesson <n>: <title>`.
fn parse_lesson_marker(line: &str) -> Option<(u32, String)> {
    let (head, title) = line.split_once(':')?;
    let mut words = head.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("lesson") {
        return None;
    }
    let number = words.next()?.parse::<u32>().ok()?;
    if words.next().is_some() {
        return None;
    }
    Some((number, title.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Course Title: Intro to Testing
Course Link: https://example.com/testing
Course Instructor: Jane Doe

Lesson 0: Welcome
Lesson Link: https://example.com/testing/0
This course teaches testing. You will write unit tests.
Lesson 1: Mocks
Mocks replace collaborators. They record calls.
";

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(800, 100)
    }

    #[test]
    fn test_parses_header_and_lessons() {
        let doc = processor()
            .process(&RawDocument::new("sample.txt", SAMPLE))
            .unwrap();

        assert_eq!(doc.course.title, "Intro to Testing");
        assert_eq!(doc.course.link.as_deref(), Some("https://example.com/testing"));
        assert_eq!(doc.course.instructor.as_deref(), Some("Jane Doe"));
        assert_eq!(doc.course.lessons.len(), 2);
        assert_eq!(
            doc.course.lessons[0].link.as_deref(),
            Some("https://example.com/testing/0")
        );
        assert_eq!(doc.course.lessons[1].title, "Mocks");
        assert!(doc.course.lessons[1].link.is_none());
    }

    #[test]
    fn test_chunks_carry_lesson_numbers_and_global_index() {
        let doc = processor()
            .process(&RawDocument::new("sample.txt", SAMPLE))
            .unwrap();

        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(doc.chunks[0].lesson_number, Some(0));
        assert_eq!(doc.chunks[1].lesson_number, Some(1));
        let indexes: Vec<_> = doc.chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert!(doc.chunks.iter().all(|c| c.course_title == "Intro to Testing"));
        assert!(!doc.chunks[0].content.contains("Lesson Link"));
    }

    #[test]
    fn test_chunk_index_strictly_increasing_across_lessons() {
        let mut text = String::from("Course Title: Long Course\n");
        for lesson in 1..=3 {
            text.push_str(&format!("Lesson {}: Part {}\n", lesson, lesson));
            text.push_str(&"Sentence about the topic at hand. ".repeat(20));
            text.push('\n');
        }

        let doc = DocumentProcessor::new(200, 40)
            .process(&RawDocument::new("long.txt", &text))
            .unwrap();

        assert!(doc.chunks.len() > 3);
        for pair in doc.chunks.windows(2) {
            assert_eq!(pair[1].chunk_index, pair[0].chunk_index + 1);
        }
    }

    #[test]
    fn test_bare_title_line_and_pre_lesson_text() {
        let text = "Building Towards Computer Use\nSome introduction before lessons.\nLesson 1: Start\nBody.";
        let doc = processor().process(&RawDocument::new("bare.txt", text)).unwrap();

        assert_eq!(doc.course.title, "Building Towards Computer Use");
        assert!(doc.course.link.is_none());
        assert_eq!(doc.chunks[0].lesson_number, None);
        assert_eq!(doc.chunks[0].content, "Some introduction before lessons.");
        assert_eq!(doc.chunks[1].lesson_number, Some(1));
    }

    #[test]
    fn test_header_only_registers_course_without_chunks() {
        let text = "Course Title: Empty Course\nCourse Instructor: Nobody\n";
        let doc = processor().process(&RawDocument::new("empty.txt", text)).unwrap();

        assert_eq!(doc.course.title, "Empty Course");
        assert_eq!(doc.course.instructor.as_deref(), Some("Nobody"));
        assert!(doc.chunks.is_empty());
    }

    #[test]
    fn test_header_keys_are_case_insensitive() {
        let text = "course title: Lower\nINSTRUCTOR: Someone\nLESSON 2: Two\ntext";
        let doc = processor().process(&RawDocument::new("case.txt", text)).unwrap();
        assert_eq!(doc.course.title, "Lower");
        assert_eq!(doc.course.instructor.as_deref(), Some("Someone"));
        assert_eq!(doc.course.lessons[0].lesson_number, 2);
    }

    #[test]
    fn test_missing_title_is_ingest_error() {
        let result = processor().process(&RawDocument::new("blank.txt", "  \n\n"));
        assert!(matches!(result, Err(AppError::Ingest(_))));

        let result = processor().process(&RawDocument::new("keyonly.txt", "Course Title:   \n"));
        assert!(matches!(result, Err(AppError::Ingest(_))));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = processor().process(&RawDocument::new("a", SAMPLE)).unwrap();
        let b = processor().process(&RawDocument::new("b", SAMPLE)).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);
        assert_ne!(a.fingerprint, fingerprint("different"));
    }

    #[test]
    fn test_marker_parsing() {
        assert_eq!(parse_lesson_marker("Lesson 3: Tools"), Some((3, "Tools".to_string())));
        assert_eq!(parse_lesson_marker("Lesson three: Tools"), None);
        assert_eq!(parse_lesson_marker("In Lesson 3: we learn"), None);
        assert_eq!(parse_lesson_marker("Lesson 3 recap: more"), None);
    }
}
