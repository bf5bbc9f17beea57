// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full pipeline in order:
//
//   Step 1: Load MNIST train + test splits   (Layer 4 - data)
//   Step 2: Reshape / one-hot / sanity logs  (Layer 3 - domain)
//   Step 3: Build datasets (+ optional hold-out)
//   Step 4: Save config                      (Layer 6 - infra)
//   Step 5: Build model, train, evaluate     (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::DigitDataset,
    loader::source_for,
    splitter::split_train_val,
};
use crate::domain::{
    split::{DigitSplit, SplitKind},
    traits::DigitSource,
    NUM_CLASSES,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::trainer::{run_training, TrainSummary};

/// Which optimiser updates the weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adadelta,
    Adam,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// checkpoints so evaluation can rebuild the same network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:         String,
    pub checkpoint_dir:   String,
    pub epochs:           usize,
    pub batch_size:       usize,
    pub lr:               f64,
    pub optimizer:        OptimizerKind,
    pub rho:              f64,
    pub epsilon:          f64,
    pub hidden:           usize,
    pub conv_dropout:     f64,
    pub dense_dropout:    f64,
    pub validation_split: Option<f64>,
    pub limit:            Option<usize>,
    pub num_workers:      usize,
    pub seed:             u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:         "data/mnist".to_string(),
            checkpoint_dir:   "checkpoints".to_string(),
            epochs:           50,
            batch_size:       128,
            lr:               1e-3,
            optimizer:        OptimizerKind::Adadelta,
            rho:              0.95,
            epsilon:          1e-7,
            hidden:           128,
            conv_dropout:     0.25,
            dense_dropout:    0.5,
            validation_split: None,
            limit:            None,
            num_workers:      1,
            seed:             42,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would make training meaningless
    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "--epochs must be at least 1");
        ensure!(self.batch_size > 0, "--batch-size must be at least 1");
        ensure!(self.lr > 0.0, "--lr must be positive");
        ensure!((0.0..1.0).contains(&self.rho), "--rho must be in [0, 1)");
        ensure!(self.epsilon > 0.0, "--epsilon must be positive");
        ensure!(self.num_workers > 0, "--num-workers must be at least 1");
        for (name, p) in [("conv", self.conv_dropout), ("dense", self.dense_dropout)] {
            ensure!((0.0..1.0).contains(&p), "{name} dropout must be in [0, 1)");
        }
        if let Some(f) = self.validation_split {
            ensure!(f > 0.0 && f < 1.0, "--validation-split must be between 0 and 1");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load both splits ──────────────────────────────────────────
        let source = source_for(&cfg.data_dir);
        tracing::info!("Loading MNIST from {}", source.describe());
        let train_split = load_split(source.as_ref(), SplitKind::Train, cfg.limit)?;
        let test_split  = load_split(source.as_ref(), SplitKind::Test, cfg.limit)?;

        // ── Step 2: Shapes as the model will see them ─────────────────────────
        describe_split(&train_split, SplitKind::Train)?;
        describe_split(&test_split, SplitKind::Test)?;

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let (train, valid, test) = self.build_datasets(&train_split, &test_split)?;
        tracing::info!(
            "Datasets: {} train, {} validation, {} test",
            train.sample_count(),
            valid.sample_count(),
            test.sample_count()
        );

        // ── Step 4: Save config for evaluate / predict ────────────────────────
        let ckpt    = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let metrics = MetricsLogger::create(ckpt.dir())?;
        ckpt.save_config(cfg)?;

        // ── Step 5: Train and evaluate (Layer 5) ──────────────────────────────
        let summary = run_training(cfg, train, valid, test, &ckpt, &metrics)?;
        tracing::info!(
            "Best validation accuracy {:.4} at epoch {}; metrics in '{}'",
            summary.best_val_acc,
            summary.best_epoch,
            metrics.csv_path().display()
        );

        Ok(summary)
    }

    /// (train, validation, test). Without --validation-split the test
    /// split doubles as the per-epoch validation set, as
    /// model.fit(validation_data=test) does.
    fn build_datasets(
        &self,
        train_split: &DigitSplit,
        test_split:  &DigitSplit,
    ) -> Result<(DigitDataset, DigitDataset, DigitDataset)> {
        let test = DigitDataset::from(test_split);
        match self.config.validation_split {
            Some(fraction) => {
                let samples = DigitDataset::from(train_split).into_samples();
                let (train, valid) = split_train_val(samples, 1.0 - fraction, self.config.seed);
                if valid.is_empty() {
                    tracing::warn!("Validation split is empty; per-epoch validation will report NaN");
                }
                Ok((DigitDataset::new(train)?, DigitDataset::new(valid)?, test))
            }
            None => Ok((DigitDataset::from(train_split), test.clone(), test)),
        }
    }
}

/// Load one split, optionally keeping only the first `limit` samples.
pub(crate) fn load_split(
    source: &dyn DigitSource,
    kind:   SplitKind,
    limit:  Option<usize>,
) -> Result<DigitSplit> {
    let split = source.load(kind)?;
    let split = match limit {
        Some(n) => split.take(n),
        None    => split,
    };
    ensure!(!split.is_empty(), "the {kind} split is empty");
    Ok(split)
}

/// Log the rank-3 → rank-4 reshape and one-hot shape of a split.
fn describe_split(split: &DigitSplit, kind: SplitKind) -> Result<()> {
    let one_hot = split.labels.one_hot(NUM_CLASSES)?;
    ensure!(one_hot.active() == split.len(), "one-hot encoding lost rows for the {kind} split");
    tracing::info!(
        "{} images {:?} → {:?}, labels [{}] → one-hot {:?}",
        kind,
        split.images.shape(),
        split.images.to_nhwc().shape(),
        split.labels.len(),
        one_hot.shape()
    );
    tracing::debug!("{} class histogram: {:?}", kind, split.labels.histogram());
    Ok(())
}
