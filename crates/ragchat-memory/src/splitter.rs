use crate::loader::Document;
use ragchat_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A bounded contiguous window of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Window text.
    pub text: String,
    /// Byte offset of the window start within the source text.
    pub start_offset: usize,
    /// Identifier of the document the window was cut from.
    pub source_id: String,
    /// Position of the window within its source (0-based).
    pub index: usize,
    /// Metadata inherited from the source document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Splits text into fixed-size windows that overlap by a constant amount.
///
/// Sizes count chars, so a window never cuts a UTF-8 sequence in half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter, validating `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> RagResult<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Window length in chars.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Shared chars between consecutive windows.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered windows tagged with `source_id`.
    ///
    /// The walk stops at the first window that reaches the end of the text,
    /// so no trailing window is made up purely of overlap.
    pub fn split(&self, source_id: &str, text: &str) -> Vec<DocumentChunk> {
        // Byte offset of every char boundary, plus the end of the text.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_len = bounds.len();
        bounds.push(text.len());

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut cursor = 0;

        while cursor < char_len {
            let end = (cursor + self.chunk_size).min(char_len);
            let (start_byte, end_byte) = (bounds[cursor], bounds[end]);
            chunks.push(DocumentChunk {
                text: text[start_byte..end_byte].to_string(),
                start_offset: start_byte,
                source_id: source_id.to_string(),
                index: chunks.len(),
                metadata: HashMap::new(),
            });
            if end == char_len {
                break;
            }
            cursor += step;
        }

        chunks
    }

    /// Split every document, carrying its metadata onto each chunk.
    ///
    /// The chunk's `source_id` is the document's `source` metadata entry, or
    /// `doc-<n>` when the document has none.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        let mut out = Vec::new();
        for (n, doc) in documents.iter().enumerate() {
            let source_id = doc
                .metadata
                .get("source")
                .cloned()
                .unwrap_or_else(|| format!("doc-{n}"));
            for mut chunk in self.split(&source_id, &doc.text) {
                chunk.metadata = doc.metadata.clone();
                out.push(chunk);
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn texts(chunks: &[DocumentChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_split_with_overlap() {
        let splitter = TextSplitter::new(4, 2).unwrap();
        let chunks = splitter.split("doc", "abcdefghij");
        assert_eq!(texts(&chunks), vec!["abcd", "cdef", "efgh", "ghij"]);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        let chunks = splitter.split("doc", "tiny");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "tiny");
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        assert!(splitter.split("doc", "").is_empty());
    }

    #[test]
    fn test_no_overlap_clips_last_window() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split("doc", "abcdefghij");
        assert_eq!(texts(&chunks), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            TextSplitter::new(0, 0),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            TextSplitter::new(4, 4),
            Err(RagError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            TextSplitter::new(4, 9),
            Err(RagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_multibyte_text_respects_char_boundaries() {
        let splitter = TextSplitter::new(3, 1).unwrap();
        let chunks = splitter.split("doc", "héllo wörld");
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 3);
        }
        assert_eq!(chunks[0].text, "hél");
        assert_eq!(chunks[1].text, "llo");
        // 'é' is two bytes, so the second window starts at byte 3.
        assert_eq!(chunks[1].start_offset, 3);
    }

    #[test]
    fn test_windows_cover_text_without_gaps() {
        let text = "The quick brown fox jumps over the lazy dog.";
        for size in 1..12 {
            for overlap in 0..size {
                let splitter = TextSplitter::new(size, overlap).unwrap();
                let chunks = splitter.split("doc", text);
                assert_eq!(chunks[0].start_offset, 0);
                let mut covered = 0;
                for chunk in &chunks {
                    assert!(chunk.start_offset <= covered, "gap before {chunk:?}");
                    assert_eq!(&text[chunk.start_offset..][..chunk.text.len()], chunk.text);
                    covered = covered.max(chunk.start_offset + chunk.text.len());
                }
                assert_eq!(covered, text.len());
            }
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let splitter = TextSplitter::new(5, 2).unwrap();
        let a = splitter.split("doc", "deterministic splitting");
        let b = splitter.split("doc", "deterministic splitting");
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_documents_carries_metadata() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        let mut tagged = Document::new("abcdefgh");
        tagged
            .metadata
            .insert("source".to_string(), "notes.txt".to_string());
        let untagged = Document::new("xyz");

        let chunks = splitter.split_documents(&[tagged, untagged]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source_id, "notes.txt");
        assert_eq!(chunks[1].index, 1);
        assert_eq!(
            chunks[1].metadata.get("source").map(String::as_str),
            Some("notes.txt")
        );
        assert_eq!(chunks[2].source_id, "doc-1");
        assert_eq!(chunks[2].index, 0);
    }
}
