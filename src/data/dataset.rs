use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::{split::DigitSplit, IMAGE_SIDE, NUM_CLASSES};

/// One MNIST image (28×28×1, channel-last, raw u8) with its digit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitSample {
    pub pixels: Vec<u8>,
    pub label:  u8,
}

#[derive(Debug, Clone)]
pub struct DigitDataset {
    samples: Vec<DigitSample>,
}

impl DigitDataset {
    /// Wrap samples, rejecting any image that is not 28×28 or any
    /// label outside 0–9. The batcher relies on both.
    pub fn new(samples: Vec<DigitSample>) -> Result<Self> {
        for (i, s) in samples.iter().enumerate() {
            ensure!(
                s.pixels.len() == IMAGE_SIDE * IMAGE_SIDE,
                "sample {i} has {} pixels, expected {}",
                s.pixels.len(),
                IMAGE_SIDE * IMAGE_SIDE
            );
            ensure!(
                (s.label as usize) < NUM_CLASSES,
                "sample {i} has label {}, not a digit class (0-9)",
                s.label
            );
        }
        Ok(Self { samples })
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn into_samples(self) -> Vec<DigitSample> { self.samples }
}

impl From<&DigitSplit> for DigitDataset {
    fn from(split: &DigitSplit) -> Self {
        // A DigitSplit already holds validated labels and 28×28 images,
        // and one image's NHWC slice is exactly its 784 pixels.
        let samples = split
            .samples()
            .map(|(pixels, label)| DigitSample { pixels: pixels.to_vec(), label })
            .collect();
        Self { samples }
    }
}

impl Dataset<DigitSample> for DigitDataset {
    fn get(&self, index: usize) -> Option<DigitSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
