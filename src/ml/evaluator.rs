// ============================================================
// Layer 5: Evaluator
// ============================================================
// Runs a trained model over a dataset without gradients and
// reports loss, overall accuracy and per-digit accuracy.
//
// Used twice:
//   - every epoch, on the validation set (trainer.rs)
//   - at the end / by the `evaluate` command, on the test set
//
// The model passed in should live on a plain (non-autodiff)
// backend, e.g. the result of `model.valid()`. Burn's Dropout
// is the identity there, so evaluation is deterministic.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};
use serde::Serialize;
use std::fmt;

use crate::data::{
    batcher::{DigitBatch, DigitBatcher},
    dataset::DigitDataset,
};
use crate::domain::NUM_CLASSES;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{DigitCnn, DigitCnnConfig};
use crate::ml::{InferBackend, InferDevice};

/// Correct / total for one digit class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub total:   usize,
    pub correct: usize,
}

impl ClassStats {
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }
}

/// Result of evaluating a model on a dataset
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    /// Mean categorical cross-entropy per sample (NaN if empty)
    pub loss:      f64,
    pub total:     usize,
    pub correct:   usize,
    pub per_class: [ClassStats; NUM_CLASSES],
    #[serde(skip)]
    loss_sum:      f64,
}

impl Default for EvalReport {
    fn default() -> Self {
        Self {
            loss:      f64::NAN,
            total:     0,
            correct:   0,
            per_class: [ClassStats::default(); NUM_CLASSES],
            loss_sum:  0.0,
        }
    }
}

impl EvalReport {
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }

    /// Fold one batch into the running totals.
    /// `mean_loss` is the batch's mean loss; it is weighted by batch size
    /// so a short final batch does not skew the average.
    pub fn record_batch(&mut self, mean_loss: f64, predicted: &[i64], labels: &[i64]) {
        let n = labels.len();
        self.loss_sum += mean_loss * n as f64;
        self.total    += n;

        for (&p, &l) in predicted.iter().zip(labels) {
            if p == l {
                self.correct += 1;
            }
            // A label outside 0–9 still counts toward the totals
            if let Some(stats) = usize::try_from(l).ok().and_then(|i| self.per_class.get_mut(i)) {
                stats.total += 1;
                if p == l {
                    stats.correct += 1;
                }
            }
        }

        self.loss = if self.total > 0 { self.loss_sum / self.total as f64 } else { f64::NAN };
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test loss:     {:.4}", self.loss)?;
        writeln!(f, "Test accuracy: {:.4} ({}/{})", self.accuracy(), self.correct, self.total)?;
        writeln!(f)?;
        writeln!(f, "digit | samples | accuracy")?;
        writeln!(f, "------+---------+---------")?;
        for (digit, stats) in self.per_class.iter().enumerate() {
            writeln!(f, "{digit:>5} | {:>7} | {:>7.2}%", stats.total, stats.accuracy() * 100.0)?;
        }
        Ok(())
    }
}

/// Evaluate over every batch a loader yields.
pub fn evaluate_batches<B: Backend>(
    model:  &DigitCnn<B>,
    loader: &dyn DataLoader<DigitBatch<B>>,
) -> Result<EvalReport> {
    let mut report = EvalReport::default();

    for batch in loader.iter() {
        let output = model.forward_loss(batch);

        let mean_loss: f64 = output.loss.into_scalar().elem::<f64>();
        let predicted = to_i64_vec(output.logits.argmax(1).flatten::<1>(0, 1))?;
        let labels    = to_i64_vec(output.labels)?;

        report.record_batch(mean_loss, &predicted, &labels);
    }

    Ok(report)
}

/// Evaluate a model on a whole dataset.
pub fn evaluate<B: Backend>(
    model:      &DigitCnn<B>,
    dataset:    DigitDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<EvalReport> {
    let loader = DataLoaderBuilder::new(DigitBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset);

    evaluate_batches(model, loader.as_ref())
}

/// Rebuild the network described by a checkpoint directory, load its
/// latest weights and evaluate it.
pub fn evaluate_checkpoint(
    ckpt:       &CheckpointManager,
    dataset:    DigitDataset,
    batch_size: usize,
) -> Result<EvalReport> {
    let device    = InferDevice::default();
    let cfg       = ckpt.load_config()?;
    let model_cfg = DigitCnnConfig::from(&cfg);

    let model: DigitCnn<InferBackend> = model_cfg.init(&device);
    let model = ckpt.load_model(model, &device)?;

    evaluate(&model, dataset, batch_size, &device)
}

fn to_i64_vec<B: Backend>(tensor: Tensor<B, 1, Int>) -> Result<Vec<i64>> {
    tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}
