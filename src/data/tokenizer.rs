// ============================================================
// Layer 4 — Word Tokenizer
// ============================================================
// Splits raw message text into word tokens.
//
// Splitting rules come from the `tokenizers` crate's BERT
// pre-tokenizer:
//   - whitespace separates tokens and is dropped
//   - every punctuation character becomes its own token
//
//   "Win a FREE prize!!" → ["Win", "a", "FREE", "prize", "!", "!"]
//
// Casing is left alone unless `lowercase` is set. Training
// keeps case by default while prediction lowercases by default,
// so the two paths can disagree on capitalised words. Both
// switches are exposed in the configs and the train/predict use
// cases warn when they differ.
//
// Reference: tokenizers crate (pre_tokenizers::bert)
//            Rust Book §8 (Strings)

use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use crate::data::vocabulary::Vocabulary;
use crate::error::{ClassifierError, Result};

/// Word-level tokenizer shared by training and prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer {
    /// Lowercase the text before splitting
    lowercase: bool,
}

impl WordTokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Split one text into word and punctuation tokens.
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let text = if self.lowercase { text.to_lowercase() } else { text.to_string() };

        let mut pretokenized = PreTokenizedString::from(text.as_str());
        BertPreTokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| ClassifierError::Format(format!("cannot tokenise text: {e}")))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(token, _, _)| token.to_string())
            .collect())
    }

    /// Tokenise a whole corpus and build its vocabulary in one pass.
    pub fn tokenize_corpus<S: AsRef<str>>(&self, texts: &[S]) -> Result<TokenizedCorpus> {
        let sequences = texts
            .iter()
            .map(|t| self.tokenize(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let vocab   = Vocabulary::build(&sequences);
        let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);

        tracing::debug!(
            "Tokenised {} texts: {} vocabulary entries, max length {}",
            sequences.len(),
            vocab.len(),
            max_len
        );

        Ok(TokenizedCorpus { sequences, vocab, max_len })
    }
}

/// Output of [`WordTokenizer::tokenize_corpus`].
#[derive(Debug, Clone)]
pub struct TokenizedCorpus {
    /// One token sequence per input text, in input order
    pub sequences: Vec<Vec<String>>,
    /// Vocabulary built from `sequences` in first-occurrence order
    pub vocab: Vocabulary,
    /// Length of the longest sequence
    pub max_len: usize,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_whitespace_and_punctuation() {
        let tok    = WordTokenizer::new(false);
        let tokens = tok.tokenize("Win a FREE prize!!").unwrap();
        assert_eq!(tokens, vec!["Win", "a", "FREE", "prize", "!", "!"]);
    }

    #[test]
    fn test_keeps_case_unless_asked() {
        let keep  = WordTokenizer::new(false).tokenize("Hello World").unwrap();
        let lower = WordTokenizer::new(true).tokenize("Hello World").unwrap();
        assert_eq!(keep, vec!["Hello", "World"]);
        assert_eq!(lower, vec!["hello", "world"]);
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        let tok = WordTokenizer::default();
        assert!(tok.tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_corpus_tracks_max_length() {
        let tok    = WordTokenizer::new(false);
        let corpus = tok.tokenize_corpus(&["call now", "free entry in a weekly competition"]).unwrap();
        assert_eq!(corpus.sequences.len(), 2);
        assert_eq!(corpus.max_len, 6);
        // 2 reserved ids + 8 distinct words
        assert_eq!(corpus.vocab.len(), 10);
    }
}
