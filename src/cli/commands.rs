// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `evaluate` and `predict`.
// Defaults reproduce the classic Keras mnist_cnn run:
// batch 128, 50 epochs, Adadelta.

use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::{OptimizerKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN on MNIST and report test accuracy
    Train(TrainArgs),

    /// Score a saved checkpoint on the MNIST test split
    Evaluate(EvaluateArgs),

    /// Classify a single test image with a saved checkpoint
    Predict(PredictArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerArg {
    Adadelta,
    Adam,
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(o: OptimizerArg) -> Self {
        match o {
            OptimizerArg::Adadelta => OptimizerKind::Adadelta,
            OptimizerArg::Adam     => OptimizerKind::Adam,
        }
    }
}

/// Arguments for `train`
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding the four MNIST IDX files (optionally .gz).
    /// When they are missing the dataset is downloaded instead.
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// Where checkpoints, config.json and metrics.csv are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Learning rate handed to the optimiser every step
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Adadelta)]
    pub optimizer: OptimizerArg,

    /// Adadelta decay for the running averages
    #[arg(long, default_value_t = 0.95)]
    pub rho: f64,

    /// Numerical stability term of the optimiser
    #[arg(long, default_value_t = 1e-7)]
    pub epsilon: f64,

    /// Hold out this fraction of the training split for validation
    /// instead of validating on the test split
    #[arg(long)]
    pub validation_split: Option<f64>,

    /// Only use the first N images of each split (quick runs)
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Seeds weight init, shuffling and the hold-out split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:         a.data_dir,
            checkpoint_dir:   a.checkpoint_dir,
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            lr:               a.lr,
            optimizer:        a.optimizer.into(),
            rho:              a.rho,
            epsilon:          a.epsilon,
            validation_split: a.validation_split,
            limit:            a.limit,
            num_workers:      a.num_workers,
            seed:             a.seed,
            ..TrainConfig::default()
        }
    }
}

/// Arguments for `evaluate`
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for `predict`
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Position of the image in the test split
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["mnist-cnn", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.optimizer, OptimizerKind::Adadelta);
        assert_eq!(cfg.validation_split, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "mnist-cnn", "train", "--optimizer", "adam", "--epochs", "3",
            "--validation-split", "0.1", "--limit", "500",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.validation_split, Some(0.1));
        assert_eq!(cfg.limit, Some(500));
    }

    #[test]
    fn test_predict_index_and_unknown_optimizer() {
        let cli = Cli::try_parse_from(["mnist-cnn", "predict", "--index", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Predict(PredictArgs { index: 7, .. })));

        assert!(Cli::try_parse_from(["mnist-cnn", "train", "--optimizer", "sgd"]).is_err());
    }
}
