// ============================================================
// Layer 4 — Embedding Initializer
// ============================================================
// Builds the initial word-vector table the classifier starts
// from, one row per vocabulary id.
//
//   1. draw every row from U(-0.25, 0.25)
//   2. overwrite the "<pad>" row with zeros
//   3. (optional) overwrite rows of tokens found in a pretrained
//      vector file with the file's vectors
//
// Pretrained file format (fastText .vec):
//
//   2000000 300                     ← header: <count> <dimension>
//   the 0.0231 -0.0118 ... 0.0042   ← token + <dimension> floats
//   ...
//
// The table is plain `f32` data; ml::model turns it into a
// burn Embedding parameter.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;

use crate::data::vocabulary::{Vocabulary, PAD_ID};
use crate::error::{ClassifierError, Result};

/// Half-width of the uniform range used for rows without a pretrained vector
pub const INIT_RANGE: f32 = 0.25;

/// Row-major `vocab_size × dim` matrix of word vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    vocab_size: usize,
    dim:        usize,
    values:     Vec<f32>,
}

/// How much of the vocabulary a pretrained file covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PretrainedStats {
    /// Vocabulary entries that received a pretrained vector
    pub matched: usize,
    /// Total vocabulary size (reserved entries included)
    pub vocab_size: usize,
}

impl EmbeddingTable {
    /// Uniform random table with a zero padding row.
    pub fn random<R: Rng>(vocab_size: usize, dim: usize, rng: &mut R) -> Self {
        let values = (0..vocab_size * dim)
            .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
            .collect();
        let mut table = Self { vocab_size, dim, values };
        table.row_mut(PAD_ID as usize).fill(0.0);
        table
    }

    /// Random table overlaid with vectors from a `.vec` file on disk.
    pub fn from_pretrained_file<R: Rng>(
        vocab: &Vocabulary,
        path:  impl AsRef<Path>,
        rng:   &mut R,
    ) -> Result<(Self, PretrainedStats)> {
        let path = path.as_ref();
        tracing::info!("Loading pretrained vectors from '{}'", path.display());
        let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
        Self::from_pretrained_reader(vocab, BufReader::new(file), rng)
            .map_err(|e| match e {
                ClassifierError::Io { source, .. } => ClassifierError::io(path, source),
                other => other,
            })
    }

    /// Random table overlaid with vectors read from `reader`.
    ///
    /// The dimension is taken from the header line. Records whose
    /// token is not in `vocab` are skipped.
    pub fn from_pretrained_reader<R: Rng, Src: BufRead>(
        vocab:  &Vocabulary,
        reader: Src,
        rng:    &mut R,
    ) -> Result<(Self, PretrainedStats)> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|e| read_error(e, 1))?,
            None => return Err(ClassifierError::Format("pretrained vector file is empty".into())),
        };
        let (_count, dim) = parse_header(&header)?;

        let mut table   = Self::random(vocab.len(), dim, rng);
        let mut matched = vec![false; vocab.len()];

        for (line_no, line) in lines.enumerate() {
            // header is line 1
            let line = line.map_err(|e| read_error(e, line_no + 2))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split(' ');
            let token = fields.next().unwrap_or_default();
            let Some(id) = vocab.id(token) else { continue };

            let vector = parse_vector(fields, dim, line_no + 2)?;
            if matched[id as usize] {
                tracing::debug!("Line {}: '{}' appears again; keeping the later vector", line_no + 2, token);
            }
            table.row_mut(id as usize).copy_from_slice(&vector);
            matched[id as usize] = true;
        }

        // the pad row stays zero even if the file carries a vector for it
        table.row_mut(PAD_ID as usize).fill(0.0);
        matched[PAD_ID as usize] = false;

        let stats = PretrainedStats {
            matched:    matched.iter().filter(|&&m| m).count(),
            vocab_size: vocab.len(),
        };
        tracing::info!(
            "There are {} / {} pretrained vectors found.",
            stats.matched,
            stats.vocab_size
        );
        Ok((table, stats))
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, id: usize) -> &[f32] {
        &self.values[id * self.dim..(id + 1) * self.dim]
    }

    fn row_mut(&mut self, id: usize) -> &mut [f32] {
        &mut self.values[id * self.dim..(id + 1) * self.dim]
    }

    /// Flat row-major values, ready for `TensorData::new`.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Undecodable text is malformed content, not an I/O failure.
fn read_error(e: std::io::Error, line_no: usize) -> ClassifierError {
    if e.kind() == std::io::ErrorKind::InvalidData {
        ClassifierError::Format(format!("line {line_no}: invalid UTF-8"))
    } else {
        ClassifierError::io("<pretrained vectors>", e)
    }
}

/// Parse `<count> <dimension>`.
fn parse_header(line: &str) -> Result<(usize, usize)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let bad = || ClassifierError::Format(format!(
        "pretrained vector header must be '<count> <dimension>', got '{line}'"
    ));
    match fields.as_slice() {
        [count, dim] => {
            let count = count.parse::<usize>().map_err(|_| bad())?;
            let dim   = dim.parse::<usize>().map_err(|_| bad())?;
            if dim == 0 {
                return Err(ClassifierError::Format("pretrained vector dimension is 0".into()));
            }
            Ok((count, dim))
        }
        _ => Err(bad()),
    }
}

fn parse_vector<'a>(
    fields:  impl Iterator<Item = &'a str>,
    dim:     usize,
    line_no: usize,
) -> Result<Vec<f32>> {
    let vector = fields
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<f32>())
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| ClassifierError::Format(format!("line {line_no}: bad float: {e}")))?;

    if vector.len() != dim {
        return Err(ClassifierError::Format(format!(
            "line {line_no}: expected {dim} values, found {}",
            vector.len()
        )));
    }
    Ok(vector)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn vocab() -> Vocabulary {
        let seq: Vec<String> = ["free", "prize", "lunch"].iter().map(|s| s.to_string()).collect();
        Vocabulary::build(&[seq])
    }

    #[test]
    fn test_random_table_is_bounded_with_zero_pad_row() {
        let mut rng = StdRng::seed_from_u64(42);
        let table   = EmbeddingTable::random(10, 4, &mut rng);
        assert_eq!(table.values().len(), 40);
        assert!(table.row(0).iter().all(|&v| v == 0.0));
        assert!(table.values().iter().all(|v| v.abs() <= INIT_RANGE));
        assert!(table.row(3).iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = EmbeddingTable::random(5, 3, &mut StdRng::seed_from_u64(7));
        let b = EmbeddingTable::random(5, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pretrained_rows_are_copied_and_counted() {
        let file = "4 3\n\
                    free 1.0 2.0 3.0\n\
                    lottery 9.0 9.0 9.0\n\
                    lunch -1 -2 -3 \n\
                    <pad> 5 5 5\n";
        let (table, stats) = EmbeddingTable::from_pretrained_reader(
            &vocab(),
            Cursor::new(file),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();

        assert_eq!(table.dim(), 3);
        assert_eq!(table.vocab_size(), 5);
        assert_eq!(table.row(2), &[1.0, 2.0, 3.0]);
        assert_eq!(table.row(4), &[-1.0, -2.0, -3.0]);
        // pad row ignores the file's vector
        assert_eq!(table.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(stats, PretrainedStats { matched: 2, vocab_size: 5 });
    }

    #[test]
    fn test_bad_header_is_format_error() {
        for header in ["300\n", "a b\n", "1 2 3\n", ""] {
            let err = EmbeddingTable::from_pretrained_reader(
                &vocab(),
                Cursor::new(header),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
            assert!(matches!(err, ClassifierError::Format(_)), "header {header:?}");
        }
    }

    #[test]
    fn test_wrong_vector_length_is_format_error() {
        let err = EmbeddingTable::from_pretrained_reader(
            &vocab(),
            Cursor::new("1 3\nprize 0.1 0.2\n"),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::Format(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let bytes = b"1 2\nprize \xff\xfe 0.5\n".to_vec();
        let err = EmbeddingTable::from_pretrained_reader(
            &vocab(),
            Cursor::new(bytes),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::Format(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_repeated_token_keeps_last_vector_and_counts_once() {
        let (table, stats) = EmbeddingTable::from_pretrained_reader(
            &vocab(),
            Cursor::new("2 2\nprize 1 1\nprize 2 2\n"),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(table.row(3), &[2.0, 2.0]);
        assert_eq!(stats.matched, 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EmbeddingTable::from_pretrained_file(
            &vocab(),
            "/definitely/not/here.vec",
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::Io { .. }));
    }

    #[test]
    fn test_reads_vectors_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 2").unwrap();
        writeln!(file, "prize 0.5 -0.5").unwrap();

        let (table, stats) = EmbeddingTable::from_pretrained_file(
            &vocab(),
            file.path(),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        assert_eq!(table.row(3), &[0.5, -0.5]);
        assert_eq!(stats.matched, 1);
    }
}
