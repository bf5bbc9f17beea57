// ============================================================
// Layer 2: PredictUseCase
// ============================================================
// Classifies one image from the MNIST test split with a saved
// checkpoint and returns everything Layer 1 needs to show it.

use anyhow::{ensure, Result};

use crate::application::train_use_case::load_split;
use crate::data::loader::source_for;
use crate::domain::{
    split::SplitKind,
    traits::{Classifier, Prediction},
    IMAGE_SIDE,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{classifier::DigitClassifier, InferBackend, InferDevice};

/// A prediction together with the image it was made for
#[derive(Debug, Clone)]
pub struct PredictOutcome {
    pub index:      usize,
    pub pixels:     Vec<u8>,
    pub true_label: u8,
    pub prediction: Prediction,
}

impl PredictOutcome {
    pub fn is_correct(&self) -> bool {
        self.prediction.digit == self.true_label
    }
}

pub struct PredictUseCase {
    classifier: Box<dyn Classifier>,
    data_dir:   String,
}

impl PredictUseCase {
    /// Load the latest checkpoint onto the default device
    pub fn new(checkpoint_dir: impl Into<String>, data_dir: impl Into<String>) -> Result<Self> {
        let ckpt       = CheckpointManager::open(checkpoint_dir.into())?;
        let classifier = DigitClassifier::<InferBackend>::from_checkpoint(&ckpt, &InferDevice::default())?;
        Ok(Self::with_classifier(Box::new(classifier), data_dir))
    }

    /// Use an already-built classifier
    pub fn with_classifier(classifier: Box<dyn Classifier>, data_dir: impl Into<String>) -> Self {
        Self { classifier, data_dir: data_dir.into() }
    }

    pub fn predict(&self, index: usize) -> Result<PredictOutcome> {
        let source = source_for(&self.data_dir);
        let test   = load_split(source.as_ref(), SplitKind::Test, None)?;
        ensure!(
            index < test.len(),
            "--index {index} is out of range: the test split has {} images",
            test.len()
        );

        let pixels     = test.images.image(index).to_vec();
        let true_label = test.labels.as_slice()[index];
        let prediction = self.classifier.classify(&pixels)?;

        Ok(PredictOutcome { index, pixels, true_label, prediction })
    }
}

/// Render a 28×28 image as shaded block characters.
pub fn render_ascii(pixels: &[u8]) -> String {
    let mut out = String::with_capacity(pixels.len() * 4 + IMAGE_SIDE);
    for row in pixels.chunks(IMAGE_SIDE) {
        for &p in row {
            out.push(match p {
                0..=50    => ' ',
                51..=101  => '░',
                102..=152 => '▒',
                153..=203 => '▓',
                _         => '█',
            });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::write_fake_mnist;

    /// Always answers the same digit
    struct Constant(u8);

    impl Classifier for Constant {
        fn classify(&self, _pixels: &[u8]) -> Result<Prediction> {
            let mut probabilities = vec![0.0; 10];
            probabilities[self.0 as usize] = 1.0;
            Ok(Prediction { digit: self.0, confidence: 1.0, probabilities })
        }
    }

    #[test]
    fn test_predicts_requested_index() {
        let dir = tempfile::tempdir().unwrap();
        write_fake_mnist(dir.path(), 5);
        let use_case = PredictUseCase::with_classifier(
            Box::new(Constant(3)),
            dir.path().to_string_lossy(),
        );

        let outcome = use_case.predict(3).unwrap();
        assert_eq!(outcome.true_label, 3);
        assert!(outcome.is_correct());
        assert_eq!(outcome.pixels.len(), IMAGE_SIDE * IMAGE_SIDE);

        assert!(!use_case.predict(1).unwrap().is_correct());
        assert!(use_case.predict(5).is_err());
    }

    #[test]
    fn test_render_ascii_shape() {
        let mut pixels = vec![0u8; IMAGE_SIDE * IMAGE_SIDE];
        pixels[0] = 255;
        let art = render_ascii(&pixels);
        assert_eq!(art.lines().count(), IMAGE_SIDE);
        assert!(art.starts_with('█'));
        assert!(art.lines().all(|l| l.chars().count() == IMAGE_SIDE));
    }
}
