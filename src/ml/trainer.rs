// ============================================================
// Layer 5: Training Loop
// ============================================================
// Manual train + validation loop over Burn's DataLoader.
//
//   for each epoch:
//     for each shuffled batch:
//       forward → categorical cross-entropy → backward → step
//     model.valid() → evaluate on the validation set
//     print summary, append metrics.csv, save checkpoint
//
// Key Burn details:
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend,
//     where dropout is disabled
//   - The validation batcher must use the inner backend too
//
// The optimiser is chosen at runtime (Adadelta by default, Adam
// on request). Both are Burn `Optimizer`s, so the epoch loop is
// generic over the optimiser type.
//
// Reference: Burn Book §5, Zeiler (2012) Adadelta

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::{batcher::DigitBatcher, dataset::DigitDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::{evaluate, evaluate_batches, EvalReport};
use crate::ml::model::{count_correct, DigitCnn, DigitCnnConfig};
use crate::ml::optim::AdadeltaConfig;
use crate::ml::{InferDevice, TrainBackend};

/// What a finished training run reports back.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub epochs_run:   usize,
    pub best_epoch:   usize,
    pub best_val_acc: f64,
    pub last:         Option<EpochMetrics>,
    /// Final model evaluated on the test split
    pub test_report:  EvalReport,
}

/// Train on the default GPU device and evaluate the final model on `test`.
pub fn run_training(
    cfg:     &TrainConfig,
    train:   DigitDataset,
    valid:   DigitDataset,
    test:    DigitDataset,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
) -> Result<TrainSummary> {
    let device = InferDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    fit::<TrainBackend>(cfg, train, valid, test, ckpt, metrics, device)
}

/// Backend-generic training entry point.
pub fn fit<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    train:   DigitDataset,
    valid:   DigitDataset,
    test:    DigitDataset,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  B::Device,
) -> Result<TrainSummary> {
    ensure!(train.sample_count() > 0, "training set is empty");
    ensure!(cfg.batch_size > 0, "batch size must be at least 1");

    B::seed(cfg.seed);

    let model: DigitCnn<B> = DigitCnnConfig::from(cfg).init(&device);
    tracing::info!("Model ready: {} parameters", model.num_params());

    match cfg.optimizer {
        OptimizerKind::Adadelta => {
            tracing::info!("Optimiser: Adadelta (rho={}, epsilon={:e})", cfg.rho, cfg.epsilon);
            let optim = AdadeltaConfig::new()
                .with_rho(cfg.rho as f32)
                .with_epsilon(cfg.epsilon as f32)
                .init();
            epoch_loop(cfg, model, optim, train, valid, test, ckpt, metrics, device)
        }
        OptimizerKind::Adam => {
            tracing::info!("Optimiser: Adam (epsilon={:e})", cfg.epsilon);
            let optim = AdamConfig::new().with_epsilon(cfg.epsilon as f32).init();
            epoch_loop(cfg, model, optim, train, valid, test, ckpt, metrics, device)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn epoch_loop<B, O>(
    cfg:       &TrainConfig,
    mut model: DigitCnn<B>,
    mut optim: O,
    train:     DigitDataset,
    valid:     DigitDataset,
    test:      DigitDataset,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    B::Device,
) -> Result<TrainSummary>
where
    B: AutodiffBackend,
    O: Optimizer<DigitCnn<B>, B>,
{
    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(DigitBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train);

    // ── Validation data loader (InnerBackend, no autodiff) ────────────────
    let valid_loader = DataLoaderBuilder::new(DigitBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(valid);

    let mut best_epoch   = 0;
    let mut best_val_acc = f64::NEG_INFINITY;
    let mut last         = None;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let output = model.forward_loss(batch);
            let n      = output.labels.dims()[0];

            loss_sum += output.loss.clone().into_scalar().elem::<f64>() * n as f64;
            correct  += count_correct(output.logits.clone(), output.labels.clone());
            seen     += n;

            let grads = GradientsParams::from_grads(output.loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
        let train_acc  = if seen > 0 { correct as f64 / seen as f64 } else { 0.0 };

        // ── Validation phase ──────────────────────────────────────────────────
        let report = evaluate_batches(&model.valid(), valid_loader.as_ref())?;

        let row = EpochMetrics::new(epoch, train_loss, train_acc, report.loss, report.accuracy());
        println!(
            "Epoch {:>3}/{} | loss={:.4} | acc={:.2}% | val_loss={:.4} | val_acc={:.2}%",
            epoch, cfg.epochs, row.train_loss, row.train_acc * 100.0,
            row.val_loss, row.val_acc * 100.0,
        );

        if row.is_improvement(best_val_acc) {
            best_val_acc = row.val_acc;
            best_epoch   = epoch;
        }

        metrics.log(&row)?;
        ckpt.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
        last = Some(row);
    }

    // ── Final evaluation on the test split ────────────────────────────────────
    let test_report = evaluate(&model.valid(), test, cfg.batch_size, &device)?;
    tracing::info!("Training complete!");

    Ok(TrainSummary {
        epochs_run: cfg.epochs,
        best_epoch,
        best_val_acc: best_val_acc.max(0.0),
        last,
        test_report,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::DigitBatch, dataset::DigitSample};
    use crate::domain::IMAGE_SIDE;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::batcher::Batcher,
    };

    type TestAutodiffBackend = Autodiff<NdArray>;

    /// Two visually distinct digits: a left half lit (label 0) and a right half lit (label 1)
    fn two_patterns(copies: usize) -> Vec<DigitSample> {
        let mut samples = Vec::new();
        for _ in 0..copies {
            for label in 0..2u8 {
                let pixels = (0..IMAGE_SIDE * IMAGE_SIDE)
                    .map(|i| {
                        let left = i % IMAGE_SIDE < IMAGE_SIDE / 2;
                        if left == (label == 0) { 255 } else { 0 }
                    })
                    .collect();
                samples.push(DigitSample { pixels, label });
            }
        }
        samples
    }

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            epochs:        2,
            batch_size:    2,
            lr:            1e-3,
            optimizer:     OptimizerKind::Adam,
            epsilon:       1e-8,
            conv_dropout:  0.0,
            dense_dropout: 0.0,
            num_workers:   1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_fit_writes_metrics_and_checkpoints() {
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::create(dir.path()).unwrap();

        let summary = fit::<TestAutodiffBackend>(
            &tiny_config(),
            DigitDataset::new(two_patterns(2)).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            &ckpt,
            &metrics,
            Default::default(),
        )
        .unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert_eq!(summary.last.as_ref().unwrap().epoch, 2);
        assert!((1..=2).contains(&summary.best_epoch));
        assert_eq!(summary.test_report.total, 2);
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_fit_with_adadelta_lowers_training_loss() {
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::create(dir.path()).unwrap();
        let cfg = TrainConfig {
            epochs:    6,
            lr:        1.0,
            optimizer: OptimizerKind::Adadelta,
            epsilon:   1e-7,
            ..tiny_config()
        };

        fit::<TestAutodiffBackend>(
            &cfg,
            DigitDataset::new(two_patterns(2)).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            &ckpt,
            &metrics,
            Default::default(),
        )
        .unwrap();

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        let train_losses: Vec<f64> = csv
            .lines()
            .skip(1)
            .map(|row| row.split(',').nth(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(train_losses.len(), 6);
        let (first, last) = (train_losses[0], train_losses[5]);
        assert!(last < first, "train loss went from {first} to {last}");
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::create(dir.path()).unwrap();

        let result = fit::<TestAutodiffBackend>(
            &tiny_config(),
            DigitDataset::new(Vec::new()).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            DigitDataset::new(two_patterns(1)).unwrap(),
            &ckpt,
            &metrics,
            Default::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_steps_overfit_one_batch() {
        let device = Default::default();
        let mut model: DigitCnn<TestAutodiffBackend> = DigitCnnConfig::new()
            .with_conv_dropout(0.0)
            .with_dense_dropout(0.0)
            .init(&device);
        let mut optim = AdamConfig::new().init();

        let batch: DigitBatch<TestAutodiffBackend> =
            DigitBatcher::new(device).batch(two_patterns(1));

        let mut losses = Vec::new();
        for _ in 0..20 {
            let output = model.forward_loss(batch.clone());
            losses.push(output.loss.clone().into_scalar().elem::<f64>());
            let grads = GradientsParams::from_grads(output.loss.backward(), &model);
            model = optim.step(1e-3, model, grads);
        }

        let first = losses[0];
        let last  = *losses.last().unwrap();
        assert!(last < first * 0.5, "loss went from {first} to {last}");
    }
}
