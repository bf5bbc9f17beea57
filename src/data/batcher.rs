// ============================================================
// Layer 4: Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<DigitSample>
// into tensors the CNN can consume.
//
// How batching works here:
//   Input:  N samples, each 28×28×1 channel-last u8 pixels
//   Output: DigitBatch with
//             images  [N, 1, 28, 28]  f32 in [0, 1]
//             targets [N, 10]         one-hot f32
//             labels  [N]             int class ids
//
// The data model keeps images channel-last (N × H × W × 1).
// Burn's Conv2d wants channel-first (N × C × H × W), so the
// batch is built as NHWC and permuted once here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::{dataset::DigitSample, preprocessor::Normalizer};
use crate::domain::{IMAGE_SIDE, NUM_CLASSES};

// ─── DigitBatch ───────────────────────────────────────────────────────────────
/// A batch of digits ready for the forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Normalised images, shape: [batch_size, 1, 28, 28]
    pub images: Tensor<B, 4>,

    /// One-hot targets, shape: [batch_size, 10]
    pub targets: Tensor<B, 2>,

    /// Class ids, shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── DigitBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct DigitBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
    normalizer: Normalizer,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, normalizer: Normalizer::new() }
    }
}

impl<B: Backend> Batcher<DigitSample, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<DigitSample>) -> DigitBatch<B> {
        let batch_size = items.len();

        // ── Images: NHWC then permute to NCHW ─────────────────────────────────
        let mut pixels = Vec::with_capacity(batch_size * IMAGE_SIDE * IMAGE_SIDE);
        for item in &items {
            self.normalizer.extend_into(&item.pixels, &mut pixels);
        }
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, IMAGE_SIDE, IMAGE_SIDE, 1]),
            &self.device,
        )
        .permute([0, 3, 1, 2]);

        // ── Targets: one 1.0 per row ──────────────────────────────────────────
        // DigitDataset::new guarantees label < 10. A sample that bypassed it
        // panics on the row index instead of producing an all-zero target.
        let mut one_hot = vec![0.0f32; batch_size * NUM_CLASSES];
        for (row, item) in one_hot.chunks_exact_mut(NUM_CLASSES).zip(&items) {
            row[item.label as usize] = 1.0;
        }
        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(one_hot, [batch_size, NUM_CLASSES]),
            &self.device,
        );

        let ids: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device);

        DigitBatch { images, targets, labels }
    }
}
