// ============================================================
// Layer 3 — Labelled Text Domain Type
// ============================================================
// One row of the spam dataset: the raw message text and its
// binary label. The dataset stores labels as the strings
// "spam" / "not_spam"; the model sees them as class ids 1 / 0.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Binary class of a message. The discriminant is the class id
/// used by the classifier's output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    NotSpam = 0,
    Spam = 1,
}

impl Label {
    /// Number of classes the classifier predicts.
    pub const COUNT: usize = 2;

    /// Class id (0 = not spam, 1 = spam)
    pub fn id(self) -> usize {
        self as usize
    }

    /// Decision rule on the spam probability: spam iff `p > 0.5`.
    pub fn from_probability(p: f32) -> Self {
        if p > 0.5 { Label::Spam } else { Label::NotSpam }
    }

    /// The string used for this label in the dataset file
    pub fn as_str(self) -> &'static str {
        match self {
            Label::NotSpam => "not_spam",
            Label::Spam => "spam",
        }
    }
}

impl FromStr for Label {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "spam" => Ok(Label::Spam),
            "not_spam" => Ok(Label::NotSpam),
            other => Err(ClassifierError::Format(format!(
                "unknown label '{other}', expected 'spam' or 'not_spam'"
            ))),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw message and its label, as read from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub label: Label,
}

impl LabeledText {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self { text: text.into(), label }
    }
}
