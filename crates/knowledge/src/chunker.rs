//! Sentence-aware text chunking with configurable size and overlap.
//!
//! Sizes are measured in characters. Text is whitespace-normalised, split at
//! Unicode sentence boundaries and packed into windows of at most
//! `chunk_size` characters. Consecutive windows share trailing sentences
//! whose combined length fits in `overlap`.

use unicode_segmentation::UnicodeSegmentation;

/// Chunk text into overlapping, sentence-aligned segments.
///
/// A sentence longer than `chunk_size` is hard-split into character windows
/// stepping by `chunk_size - overlap`. Output is deterministic.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let pieces: Vec<String> = normalized
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(|sentence| {
            if char_len(sentence) > chunk_size {
                hard_split(sentence, chunk_size, overlap)
            } else {
                vec![sentence.to_string()]
            }
        })
        .collect();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < pieces.len() {
        // Pack as many pieces as fit; the first piece always fits
        let mut len = 0;
        let mut end = start;
        while end < pieces.len() {
            let add = char_len(&pieces[end]) + usize::from(end > start);
            if end > start && len + add > chunk_size {
                break;
            }
            len += add;
            end += 1;
        }

        chunks.push(pieces[start..end].join(" "));

        if end >= pieces.len() {
            break;
        }

        // Carry trailing pieces into the next window, always advancing
        let mut next = end;
        let mut carried = 0;
        while next > start + 1 {
            let add = char_len(&pieces[next - 1]) + usize::from(carried > 0);
            if carried + add > overlap {
                break;
            }
            carried += add;
            next -= 1;
        }
        start = next;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split an oversized sentence into fixed character windows.
fn hard_split(sentence: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        windows.push(window.trim().to_string());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    windows.retain(|w| !w.is_empty());
    windows
}
