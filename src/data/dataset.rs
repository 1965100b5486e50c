use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::EncodedMatrix;
use crate::domain::sample::Label;
use crate::error::{ClassifierError, Result};

/// One encoded message: a padded id row and its class id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationItem {
    pub ids:   Vec<u32>,
    pub label: usize,
}

pub struct ClassificationDataset {
    items: Vec<ClassificationItem>,
}

impl ClassificationDataset {
    pub fn new(items: Vec<ClassificationItem>) -> Self { Self { items } }

    /// Pair every row of `matrix` with its label.
    pub fn from_encoded(matrix: &EncodedMatrix, labels: &[Label]) -> Result<Self> {
        if matrix.num_rows() != labels.len() {
            return Err(ClassifierError::Shape(format!(
                "{} encoded rows but {} labels",
                matrix.num_rows(),
                labels.len()
            )));
        }
        let items = matrix
            .rows()
            .zip(labels)
            .map(|(row, label)| ClassificationItem { ids: row.to_vec(), label: label.id() })
            .collect();
        Ok(Self { items })
    }

    pub fn sample_count(&self) -> usize { self.items.len() }

    pub fn items(&self) -> &[ClassificationItem] { &self.items }

    pub fn into_items(self) -> Vec<ClassificationItem> { self.items }
}

impl Dataset<ClassificationItem> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<ClassificationItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::{Encoder, OverflowPolicy};
    use crate::data::vocabulary::Vocabulary;

    fn matrix(rows: &[&str]) -> (Vocabulary, EncodedMatrix) {
        let seqs: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.split_whitespace().map(str::to_string).collect())
            .collect();
        let vocab  = Vocabulary::build(&seqs);
        let matrix = Encoder::new(&vocab, 4, OverflowPolicy::Truncate).encode_all(&seqs).unwrap();
        (vocab, matrix)
    }

    #[test]
    fn test_pairs_rows_with_labels() {
        let (_, m) = matrix(&["free prize", "hello"]);
        let ds     = ClassificationDataset::from_encoded(&m, &[Label::Spam, Label::NotSpam]).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0).unwrap(), ClassificationItem { ids: vec![2, 3, 0, 0], label: 1 });
        assert_eq!(ds.get(1).unwrap().label, 0);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_label_count_mismatch_is_shape_error() {
        let (_, m) = matrix(&["free prize", "hello"]);
        let err    = ClassificationDataset::from_encoded(&m, &[Label::Spam]).err().unwrap();
        assert!(matches!(err, ClassifierError::Shape(_)));
    }
}
