// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the IDX files on disk and the tensor
// batches the training loop consumes:
//
//   IDX files (.gz or plain) / burn download
//       │
//       ▼
//   loader        → DigitSplit (u8 images + labels)
//       │
//       ▼
//   splitter      → optional train / validation hold-out
//       │
//       ▼
//   DigitDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   DigitBatcher  → NHWC → NCHW, [0, 1] pixels, one-hot targets
//       │
//       ▼
//   DataLoader    → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads MNIST IDX files, or falls back to burn's download
pub mod loader;

/// Scales u8 pixels into [0, 1] floats
pub mod preprocessor;

/// Implements Burn's Dataset trait for digit samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits samples into train/validation sets
pub mod splitter;
