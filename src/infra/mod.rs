// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by more than one workflow:
//
//   checkpoint.rs Saving and loading model weights with
//                   Burn's CompactRecorder, plus TrainConfig
//                   as JSON so evaluate/predict can rebuild
//                   the network.
//
//   metrics.rs    Per-epoch loss/accuracy rows written to
//                   a CSV file for plotting learning curves.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
