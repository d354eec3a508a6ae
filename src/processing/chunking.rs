//! Word-window chunking.
//!
//! Text is split on runs of whitespace and regrouped into chunks of at most `max_words`
//! words joined by single spaces. The word budget approximates the embedding model's token
//! limit; it is a word count, not a token count.
//!
//! Chunks are produced lazily so each one can be embedded and dropped before the next is
//! built. Re-joining every chunk with a single space reproduces the whitespace-normalized
//! input.

use super::types::ChunkingError;
use std::iter::FusedIterator;
use std::str::SplitWhitespace;

/// Word budget that keeps chunks under common sentence-embedding input limits.
pub const DEFAULT_MAX_WORDS: usize = 512;

/// Splits text into bounded word windows.
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    max_words: usize,
}

impl WordChunker {
    /// Build a chunker emitting at most `max_words` words per chunk.
    pub fn new(max_words: usize) -> Result<Self, ChunkingError> {
        if max_words == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self { max_words })
    }

    /// Configured word budget.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Lazily chunk `text`. Calling this again (or cloning the iterator) restarts the sequence.
    pub fn chunks<'a>(&self, text: &'a str) -> WordChunks<'a> {
        WordChunks {
            words: text.split_whitespace(),
            max_words: self.max_words,
        }
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Iterator over the chunks of one text; see [`WordChunker::chunks`].
#[derive(Debug, Clone)]
pub struct WordChunks<'a> {
    words: SplitWhitespace<'a>,
    max_words: usize,
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.words.next()?;
        let mut chunk = String::from(first);
        for word in self.words.by_ref().take(self.max_words - 1) {
            chunk.push(' ');
            chunk.push_str(word);
        }
        Some(chunk)
    }
}

impl FusedIterator for WordChunks<'_> {}

/// Whether `text` holds at least one word.
pub(crate) fn has_words(text: &str) -> bool {
    text.split_whitespace().next().is_some()
}
