// ============================================================
// Layer 4 — Encoder
// ============================================================
// Turns token sequences into a fixed-width matrix of ids.
//
//   1. pad every sequence with "<pad>" up to `max_len`
//   2. map each token to its vocabulary id
//      (tokens the vocabulary has never seen → "<unk>" id)
//
// A sequence longer than `max_len` is handled by the configured
// OverflowPolicy: keep the first `max_len` tokens, or refuse
// with a ShapeError.
//
// Every row of the resulting EncodedMatrix has the same width,
// which is what lets the batcher reshape a flat id buffer into
// a [batch, max_len] tensor.

use serde::{Deserialize, Serialize};

use crate::data::vocabulary::{Vocabulary, PAD_TOKEN};
use crate::error::{ClassifierError, Result};

/// What to do with a sequence longer than the target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the first `max_len` tokens
    #[default]
    Truncate,
    /// Fail with a ShapeError
    Error,
}

/// Encodes token sequences against a fixed vocabulary and width.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    vocab:    &'a Vocabulary,
    max_len:  usize,
    overflow: OverflowPolicy,
}

impl<'a> Encoder<'a> {
    pub fn new(vocab: &'a Vocabulary, max_len: usize, overflow: OverflowPolicy) -> Self {
        Self { vocab, max_len, overflow }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Pad (or truncate) one token sequence to exactly `max_len` tokens.
    pub fn pad<'t>(&self, tokens: &'t [String]) -> Result<Vec<&'t str>> {
        let kept = self.fit_length(tokens)?;
        let mut padded: Vec<&str> = kept.iter().map(String::as_str).collect();
        padded.resize(self.max_len, PAD_TOKEN);
        Ok(padded)
    }

    /// Encode one sequence into exactly `max_len` ids.
    pub fn encode(&self, tokens: &[String]) -> Result<Vec<u32>> {
        Ok(self
            .pad(tokens)?
            .into_iter()
            .map(|t| self.vocab.id_or_unk(t))
            .collect())
    }

    /// Encode a batch of sequences into one matrix.
    pub fn encode_all(&self, sequences: &[Vec<String>]) -> Result<EncodedMatrix> {
        let mut ids = Vec::with_capacity(sequences.len() * self.max_len);
        for seq in sequences {
            ids.extend(self.encode(seq)?);
        }
        Ok(EncodedMatrix { width: self.max_len, ids })
    }

    fn fit_length<'t>(&self, tokens: &'t [String]) -> Result<&'t [String]> {
        if tokens.len() <= self.max_len {
            return Ok(tokens);
        }
        match self.overflow {
            OverflowPolicy::Truncate => {
                tracing::debug!(
                    "Truncating sequence of {} tokens to {}",
                    tokens.len(),
                    self.max_len
                );
                Ok(&tokens[..self.max_len])
            }
            OverflowPolicy::Error => Err(ClassifierError::Shape(format!(
                "sequence of {} tokens exceeds the maximum length {}",
                tokens.len(),
                self.max_len
            ))),
        }
    }
}

/// Row-major matrix of token ids; every row is `width` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMatrix {
    width: usize,
    ids:   Vec<u32>,
}

impl EncodedMatrix {
    /// Width of every row (the padded sequence length)
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_rows(&self) -> usize {
        if self.width == 0 { 0 } else { self.ids.len() / self.width }
    }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.ids[i * self.width..(i + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks_exact panics on 0, and a zero-width matrix has no rows anyway
        self.ids.chunks_exact(self.width.max(1)).take(self.num_rows())
    }

    /// Check that every id indexes a row of a `vocab_size`-row table.
    pub fn validate(&self, vocab_size: usize) -> Result<()> {
        match self.ids.iter().find(|&&id| id as usize >= vocab_size) {
            Some(&id) => Err(ClassifierError::Vocabulary { id, vocab_size }),
            None => Ok(()),
        }
    }
}
