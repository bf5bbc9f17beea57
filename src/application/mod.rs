// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Each use case wires the lower layers together for one command.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - File formats belong to Layers 4 and 6
//
// Layer 1 builds a use case, calls it, and prints what comes back.

// Load → reshape → train for N epochs → evaluate on test
pub mod train_use_case;

// Reload a checkpoint and score it on the test split
pub mod evaluate_use_case;

// Classify one test image with a checkpoint
pub mod predict_use_case;
