// ============================================================
// Layer 3: Label Vector and One-Hot Encoding
// ============================================================
// Labels are a rank-1 array of digit classes 0–9.
// The loss function compares the model's class distribution
// against a one-hot rank-2 array (count × 10):
//
//   label 3  →  [0, 0, 0, 1, 0, 0, 0, 0, 0, 0]
//
// Reference: Rust Book §8 (Vectors)

use anyhow::{ensure, Result};

use crate::domain::NUM_CLASSES;

/// Rank-1 vector of digit labels, each in `0..10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVector {
    labels: Vec<u8>,
}

impl LabelVector {
    /// Wrap raw labels. Fails on any value outside 0–9.
    pub fn new(labels: Vec<u8>) -> Result<Self> {
        if let Some((pos, bad)) = labels
            .iter()
            .enumerate()
            .find(|(_, &l)| l as usize >= NUM_CLASSES)
        {
            anyhow::bail!("label {bad} at index {pos} is not a digit class (0-9)");
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    /// Keep only the first `n` labels
    pub fn take(mut self, n: usize) -> Self {
        self.labels.truncate(n);
        self
    }

    /// Count of samples per class
    pub fn histogram(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0usize; NUM_CLASSES];
        for &l in &self.labels {
            counts[l as usize] += 1;
        }
        counts
    }

    /// Encode as a `count × num_classes` one-hot matrix.
    pub fn one_hot(&self, num_classes: usize) -> Result<OneHot> {
        ensure!(
            num_classes >= NUM_CLASSES,
            "one-hot width {num_classes} cannot hold {NUM_CLASSES} digit classes"
        );
        let mut values = vec![0.0f32; self.labels.len() * num_classes];
        for (row, &label) in self.labels.iter().enumerate() {
            values[row * num_classes + label as usize] = 1.0;
        }
        Ok(OneHot { values, rows: self.labels.len(), cols: num_classes })
    }
}

/// Rank-2 one-hot matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHot {
    values: Vec<f32>,
    rows:   usize,
    cols:   usize,
}

impl OneHot {
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Number of 1.0 entries; equals the row count for a valid encoding
    pub fn active(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1.0).count()
    }
}
