//! Recursive character splitting with overlap.
//!
//! Text is split on the coarsest separator present (paragraph, line, word,
//! character), oversized pieces are split again with the finer separators,
//! and small pieces are merged back up to `chunk_size` characters. When a
//! chunk is flushed, trailing pieces totalling at most `chunk_overlap`
//! characters are carried into the next one.

use std::collections::VecDeque;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A chunk of one page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk within the document
    pub ordinal: u32,
    /// 1-based page number the chunk came from
    pub page: u32,
    pub text: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split pages into ordered chunks. Blank pages contribute nothing.
pub fn chunk_pages(pages: &[String], settings: ChunkSettings) -> Vec<TextChunk> {
    let size = settings.chunk_size.max(1);
    let overlap = settings.chunk_overlap.min(size.saturating_sub(1));

    let mut chunks = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        for text in split_text(page, size, overlap) {
            chunks.push(TextChunk {
                ordinal: chunks.len() as u32,
                page: page_idx as u32 + 1,
                text,
            });
        }
    }
    chunks
}

/// Split one text into chunks of at most `size` characters.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_recursive(text, &SEPARATORS, size, overlap)
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect()
}

fn split_recursive(text: &str, separators: &[&str], size: usize, overlap: usize) -> Vec<String> {
    let position = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len() - 1);
    let separator = separators[position];
    let finer = &separators[position + 1..];

    let pieces: Vec<&str> = if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|p| !p.is_empty()).collect()
    };

    let mut out = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();
    for piece in pieces {
        if char_len(piece) <= size {
            fitting.push(piece);
            continue;
        }
        if !fitting.is_empty() {
            out.extend(merge_pieces(&fitting, separator, size, overlap));
            fitting.clear();
        }
        out.extend(split_recursive(piece, finer, size, overlap));
    }
    if !fitting.is_empty() {
        out.extend(merge_pieces(&fitting, separator, size, overlap));
    }
    out
}

fn merge_pieces(pieces: &[&str], separator: &str, size: usize, overlap: usize) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut out = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    // Length of `current` joined with separators.
    let mut total = 0usize;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len + sep_len > size && !current.is_empty() {
            out.push(join(&current, separator));
            while !current.is_empty() && (total > overlap || total + len + sep_len > size) {
                if let Some(first) = current.pop_front() {
                    total -= char_len(first);
                    if !current.is_empty() {
                        total -= sep_len;
                    }
                }
            }
        }

        if !current.is_empty() {
            total += sep_len;
        }
        total += len;
        current.push_back(piece);
    }

    if !current.is_empty() {
        out.push(join(&current, separator));
    }
    out
}

fn join(pieces: &VecDeque<&str>, separator: &str) -> String {
    pieces
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("  hello world  ", 100, 10), vec!["hello world"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(split_text(" \n\n \t", 100, 10).is_empty());
        let chunks = chunk_pages(&["".to_string(), "   ".to_string()], ChunkSettings::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = split_text(text, 15, 8);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].starts_with(last_word),
                "expected {:?} to start with {:?}",
                pair[1],
                last_word
            );
        }
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let text = "alpha beta gamma\n\ndelta epsilon zeta";
        let chunks = split_text(text, 20, 0);
        assert_eq!(chunks, vec!["alpha beta gamma", "delta epsilon zeta"]);
    }

    #[test]
    fn long_words_are_split_by_character() {
        let chunks = split_text("abcdefghij", 4, 0);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn pages_are_numbered_and_ordinals_are_global() {
        let pages = vec!["first page".to_string(), "".to_string(), "third page".to_string()];
        let chunks = chunk_pages(&pages, ChunkSettings::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].ordinal, chunks[0].page), (0, 1));
        assert_eq!((chunks[1].ordinal, chunks[1].page), (1, 3));
    }

    proptest! {
        #[test]
        fn chunks_never_exceed_size(
            text in "[a-z \\n]{0,400}",
            size in 1usize..60,
            overlap in 0usize..30,
        ) {
            let overlap = overlap.min(size - 1);
            let chunks = split_text(&text, size, overlap);
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= size);
                prop_assert!(!chunk.trim().is_empty());
            }
            if !text.trim().is_empty() {
                prop_assert!(!chunks.is_empty());
            }
        }
    }
}
