// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against the concrete CSV loader or the burn-backed predictor.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::sample::{Label, LabeledText};
use crate::error::Result;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can produce labelled messages.
///
/// Implementations:
///   - CsvDatasetLoader → reads a `text,label` CSV file
pub trait DatasetSource {
    /// Load every labelled message from this source, in file order.
    fn load_all(&self) -> Result<Vec<LabeledText>>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// Any component that scores raw text as spam / not spam.
///
/// Implementations:
///   - Predictor → tokenise, encode, CNN forward, softmax
pub trait TextClassifier {
    /// Probability that `text` is spam, in [0, 1].
    fn spam_probability(&self, text: &str) -> Result<f32>;

    /// Hard decision: spam iff the probability is above one half.
    fn classify(&self, text: &str) -> Result<Label> {
        Ok(Label::from_probability(self.spam_probability(text)?))
    }
}
