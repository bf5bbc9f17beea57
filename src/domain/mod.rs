// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types describing the MNIST data before any
// framework sees it:
//
//   images.rs rank-3 u8 image batches and their rank-4
//               (channel-last) reshape
//   labels.rs digit label vectors and one-hot encoding
//   split.rs  a matched (images, labels) pair
//   traits.rs DigitSource and Classifier abstractions
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Raw and reshaped image batches
pub mod images;

/// Label vectors and one-hot encoding
pub mod labels;

/// A train or test split: images plus their labels
pub mod split;

/// Core abstractions (traits) that other layers implement
pub mod traits;

/// Width and height of an MNIST image in pixels
pub const IMAGE_SIDE: usize = 28;

/// Number of digit classes (0 through 9)
pub const NUM_CLASSES: usize = 10;
