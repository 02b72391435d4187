//! Greedy word-packing chunker with page tracking

use crate::types::{Chunk, ExtractedText};

/// Default maximum chunk length in characters
pub const DEFAULT_MAX_CHARS: usize = 600;

/// Packs whitespace-separated words into chunks of bounded length
#[derive(Debug, Clone)]
pub struct WordChunker {
    /// Maximum chunk length in characters
    max_chars: usize,
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl WordChunker {
    /// Create a chunker. A zero limit is treated as one character.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chunk every page of a document; ordinals restart at 1 on each page
    pub fn chunk_document(&self, fingerprint: &str, text: &ExtractedText) -> Vec<Chunk> {
        text.pages
            .iter()
            .flat_map(|page| {
                self.split(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, chunk)| Chunk::new(fingerprint, page.number, i as u32 + 1, chunk))
            })
            .collect()
    }

    /// Split text into chunks of words joined by single spaces.
    ///
    /// A word is appended while the joined length stays within the limit. A
    /// single word longer than the limit becomes a chunk of its own.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();

            if !current.is_empty() && current_len + 1 + word_len > self.max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageText;

    const POLICY_TEXT: &str = "A grace period of thirty days is allowed for payment of premium.\n\
        Pre-existing diseases are covered after 36 months of continuous coverage.  \
        Room rent is limited to 1% of the sum insured per day.";

    #[test]
    fn test_words_reconstruct_original_sequence() {
        let chunker = WordChunker::new(40);
        let chunks = chunker.split(POLICY_TEXT);

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split(' ')).collect();
        let original: Vec<&str> = POLICY_TEXT.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_no_chunk_exceeds_limit() {
        for limit in [15, 25, 40, 600] {
            let chunks = WordChunker::new(limit).split(POLICY_TEXT);
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                assert!(chunk.chars().count() <= limit, "{:?} exceeds {}", chunk, limit);
            }
        }
    }

    #[test]
    fn test_packing_is_greedy() {
        let chunks = WordChunker::new(11).split("aaa bbb ccc ddd");
        assert_eq!(chunks, vec!["aaa bbb ccc", "ddd"]);
    }

    #[test]
    fn test_oversized_word_stands_alone() {
        let chunks = WordChunker::new(5).split("ab abcdefghij cd");
        assert_eq!(chunks, vec!["ab", "abcdefghij", "cd"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(WordChunker::default().split("  \n\t ").is_empty());
    }

    #[test]
    fn test_chunk_document_ids_restart_per_page() {
        let text = ExtractedText::new(vec![
            PageText {
                number: 1,
                text: "one two three four".to_string(),
            },
            PageText {
                number: 2,
                text: String::new(),
            },
            PageText {
                number: 3,
                text: "five six".to_string(),
            },
        ]);

        let chunks = WordChunker::new(10).chunk_document("abcd", &text);
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "abcd-page_1_chunk_1",
                "abcd-page_1_chunk_2",
                "abcd-page_3_chunk_1",
            ]
        );
        assert_eq!(chunks[0].text, "one two");
        assert_eq!(chunks[1].text, "three four");
        assert_eq!(chunks[2].page, 3);
    }
}
