// ============================================================
// Layer 3: DigitSplit Domain Type
// ============================================================
// One half of MNIST (train: 60 000 images, test: 10 000)
// as a matched pair of images and labels.

use anyhow::{ensure, Result};

use crate::domain::{images::ImageBatch, labels::LabelVector};

/// Which half of the dataset to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Train,
    Test,
}

impl std::fmt::Display for SplitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitKind::Train => write!(f, "train"),
            SplitKind::Test  => write!(f, "test"),
        }
    }
}

/// Images with one label per image.
#[derive(Debug, Clone)]
pub struct DigitSplit {
    pub images: ImageBatch,
    pub labels: LabelVector,
}

impl DigitSplit {
    /// Pair images with labels. Fails if the counts differ.
    pub fn new(images: ImageBatch, labels: LabelVector) -> Result<Self> {
        ensure!(
            images.len() == labels.len(),
            "{} images but {} labels",
            images.len(),
            labels.len()
        );
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Keep only the first `n` samples
    pub fn take(self, n: usize) -> Self {
        Self {
            images: self.images.take(n),
            labels: self.labels.take(n),
        }
    }

    /// Iterate over `(pixels, label)` pairs
    pub fn samples(&self) -> impl Iterator<Item = (&[u8], u8)> {
        self.images.iter().zip(self.labels.as_slice().iter().copied())
    }
}
