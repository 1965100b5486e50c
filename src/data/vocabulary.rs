// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Bijection between tokens and integer ids.
//
//   id 0 → "<pad>"   fills short sequences up to the fixed width
//   id 1 → "<unk>"   stands in for tokens never seen in the corpus
//   id 2.. → corpus tokens, in the order they first appear
//
// The vocabulary is built once from the full corpus and then
// passed by reference to the encoder, the embedding initializer
// and the predictor. Nothing rebuilds it per split.
//
// It serialises as a plain JSON array of tokens (index = id);
// the reverse index is rebuilt on load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    /// id → token
    tokens: Vec<String>,
    /// token → id
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// A vocabulary holding only the two reserved entries.
    pub fn new() -> Self {
        let mut vocab = Self { tokens: Vec::new(), index: HashMap::new() };
        vocab.insert(PAD_TOKEN);
        vocab.insert(UNK_TOKEN);
        vocab
    }

    /// Build from token sequences, assigning ids in first-occurrence order.
    pub fn build<S: AsRef<str>>(sequences: &[Vec<S>]) -> Self {
        let mut vocab = Self::new();
        for token in sequences.iter().flatten() {
            vocab.insert(token.as_ref());
        }
        vocab
    }

    /// Return the id of `token`, adding it if unseen.
    fn insert(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.index.get(token) {
            return id;
        }
        let id = self.tokens.len() as u32;
        self.tokens.push(token.to_string());
        self.index.insert(token.to_string(), id);
        id
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Id of `token`, or the unknown id when it is out of vocabulary.
    pub fn id_or_unk(&self, token: &str) -> u32 {
        self.id(token).unwrap_or(UNK_ID)
    }

    /// Token for `id`; ids past the end are a [`ClassifierError::Vocabulary`].
    pub fn token(&self, id: u32) -> Result<&str> {
        self.tokens
            .get(id as usize)
            .map(String::as_str)
            .ok_or(ClassifierError::Vocabulary { id, vocab_size: self.len() })
    }

    /// Map ids back to tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<Vec<&str>> {
        ids.iter().map(|&id| self.token(id)).collect()
    }

    /// Number of entries including the two reserved ones.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: the reserved entries are present from construction.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate `(id, token)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tokens.iter().enumerate().map(|(i, t)| (i as u32, t.as_str()))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = ClassifierError;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        if tokens.first().map(String::as_str) != Some(PAD_TOKEN)
            || tokens.get(1).map(String::as_str) != Some(UNK_TOKEN)
        {
            return Err(ClassifierError::Format(format!(
                "vocabulary must start with '{PAD_TOKEN}' and '{UNK_TOKEN}'"
            )));
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), id as u32).is_some() {
                return Err(ClassifierError::Format(format!(
                    "duplicate vocabulary token '{token}'"
                )));
            }
        }
        Ok(Self { tokens, index })
    }
}
