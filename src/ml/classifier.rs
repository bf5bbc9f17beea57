// ============================================================
// Layer 5: Digit Classifier
// ============================================================
// Loads a checkpoint and classifies one image at a time.
// Implements the domain's Classifier trait so the predict
// workflow never sees tensors.

use anyhow::{anyhow, ensure, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::{batcher::DigitBatcher, dataset::DigitSample};
use crate::domain::{
    traits::{Classifier, Prediction},
    IMAGE_SIDE,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{DigitCnn, DigitCnnConfig};

pub struct DigitClassifier<B: Backend> {
    model:   DigitCnn<B>,
    batcher: DigitBatcher<B>,
}

impl<B: Backend> DigitClassifier<B> {
    pub fn new(model: DigitCnn<B>, device: B::Device) -> Self {
        Self { model, batcher: DigitBatcher::new(device) }
    }

    /// Rebuild the architecture from train_config.json and load the latest weights.
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: &B::Device) -> Result<Self> {
        let cfg   = ckpt.load_config()?;
        let model = DigitCnnConfig::from(&cfg).init::<B>(device);
        let model = ckpt.load_model(model, device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, device.clone()))
    }
}

impl<B: Backend> Classifier for DigitClassifier<B> {
    fn classify(&self, pixels: &[u8]) -> Result<Prediction> {
        ensure!(
            pixels.len() == IMAGE_SIDE * IMAGE_SIDE,
            "expected a {IMAGE_SIDE}×{IMAGE_SIDE} image, got {} pixels",
            pixels.len()
        );

        // The label is unused for prediction
        let batch  = self.batcher.batch(vec![DigitSample { pixels: pixels.to_vec(), label: 0 }]);
        let logits = self.model.forward(batch.images);

        let probabilities: Vec<f32> = softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))?;

        let (digit, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        tracing::debug!("Predicted {} with p={:.4}", digit, confidence);

        Ok(Prediction { digit: digit as u8, confidence, probabilities })
    }
}
