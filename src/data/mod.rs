// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to tensor batches.
//
//   dataset.csv
//       │
//       ▼
//   CsvDatasetLoader  → (text, label) rows
//       │
//       ▼
//   WordTokenizer     → token sequences + Vocabulary + max length
//       │
//       ▼
//   Encoder           → fixed-width id matrix
//       │
//       ▼
//   split_train_val   → seeded train / validation split
//       │
//       ▼
//   ClassificationDataset + ClassificationBatcher → tensor batches
//
//   EmbeddingTable    → initial word vectors (random or pretrained)
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the `text,label` CSV dataset
pub mod loader;

/// Splits text into word and punctuation tokens
pub mod tokenizer;

/// Token ↔ id mapping with reserved pad / unknown ids
pub mod vocabulary;

/// Pads token sequences and maps them to ids
pub mod encoder;

/// Random / pretrained initial embedding table
pub mod embeddings;

/// Implements Burn's Dataset trait for encoded messages
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
