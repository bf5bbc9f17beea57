// ============================================================
// Layer 2: EvaluateUseCase
// ============================================================
// Re-evaluates a saved checkpoint on the MNIST test split:
//
//   Step 1: Open checkpoint directory        (Layer 6 - infra)
//   Step 2: Load the test split              (Layer 4 - data)
//   Step 3: Rebuild model, load weights, run (Layer 5 - ml)

use anyhow::Result;

use crate::application::train_use_case::load_split;
use crate::data::{dataset::DigitDataset, loader::source_for};
use crate::domain::split::SplitKind;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{evaluate_checkpoint, EvalReport};

pub struct EvaluateUseCase {
    ckpt:       CheckpointManager,
    data_dir:   String,
    batch_size: usize,
    limit:      Option<usize>,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: impl Into<String>,
        data_dir:       impl Into<String>,
        batch_size:     usize,
        limit:          Option<usize>,
    ) -> Result<Self> {
        anyhow::ensure!(batch_size > 0, "--batch-size must be at least 1");
        let ckpt = CheckpointManager::open(checkpoint_dir.into())?;
        Ok(Self { ckpt, data_dir: data_dir.into(), batch_size, limit })
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let source = source_for(&self.data_dir);
        tracing::info!("Loading MNIST test split from {}", source.describe());
        let test = load_split(source.as_ref(), SplitKind::Test, self.limit)?;

        tracing::info!("Evaluating {} test images", test.len());
        evaluate_checkpoint(&self.ckpt, DigitDataset::from(&test), self.batch_size)
    }
}
