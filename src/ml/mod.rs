// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All Burn model, optimiser and training code lives here.
// The application layer calls into this layer but never
// builds tensors itself.
//
//   model.rs      the CNN (two 3×3 convolutions, max-pool,
//                   dropout, two dense layers) and its loss
//   optim.rs      Adadelta as a Burn SimpleOptimizer
//   trainer.rs    the epoch loop: forward, loss, backward,
//                   optimiser step, validation, checkpoints
//   evaluator.rs  loss / accuracy / per-class accuracy on
//                   a held-out set
//   classifier.rs single-image prediction from a checkpoint
//
// Backends: training runs on Autodiff<Wgpu>; validation,
// evaluation and prediction on plain Wgpu. Tests use NdArray.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};

/// The CNN architecture
pub mod model;

/// Adadelta optimiser
pub mod optim;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Held-out evaluation and reports
pub mod evaluator;

/// Single-image classification from a checkpoint
pub mod classifier;

/// Backend used for training (gradients enabled)
pub type TrainBackend = Autodiff<Wgpu>;

/// Backend used for validation, evaluation and prediction
pub type InferBackend = Wgpu;

pub type InferDevice = WgpuDevice;
