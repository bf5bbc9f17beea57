// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The application layer only sees these traits, so the data
// source (local IDX files, or the downloaded copy) and the
// classifier can be swapped without touching the workflow.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::split::{DigitSplit, SplitKind};

// ─── DigitSource ──────────────────────────────────────────────────────────────
/// Anything that can produce the MNIST train or test split.
///
/// Implementations:
///   - IdxDirectory    → reads IDX files (optionally .gz) from disk
///   - DownloadedMnist → burn's downloader and cache
pub trait DigitSource {
    /// Human-readable description for log lines
    fn describe(&self) -> String;

    /// Load one split of the dataset
    fn load(&self, kind: SplitKind) -> Result<DigitSplit>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// The outcome of classifying one image
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Most likely digit
    pub digit: u8,
    /// Softmax probability of that digit
    pub confidence: f32,
    /// Full distribution over the ten classes
    pub probabilities: Vec<f32>,
}

/// Anything that can classify a single 28×28 image.
pub trait Classifier {
    fn classify(&self, pixels: &[u8]) -> Result<Prediction>;
}
