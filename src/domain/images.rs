// ============================================================
// Layer 3: Image Batch Domain Type
// ============================================================
// MNIST images arrive as a rank-3 array of unsigned 8-bit
// pixel intensities: count × rows × cols (28 × 28).
//
// Convolution layers want an explicit channel axis, so before
// use the batch is reshaped to rank 4:
//
//   count × 28 × 28   →   count × 28 × 28 × 1
//
// The pixels are stored once, row-major, in a flat Vec<u8>.
// Reshaping only changes the logical shape; the bytes are the
// same. Normalising to [0, 1] is the batcher's job (Layer 4).
//
// Reference: Rust Book §5 (Structs and Methods)
//            Rust Book §8 (Vectors)

use anyhow::{ensure, Result};

/// A rank-3 batch of grayscale images, `count × rows × cols`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch {
    pixels: Vec<u8>,
    count:  usize,
    rows:   usize,
    cols:   usize,
}

impl ImageBatch {
    /// Build a batch from flat row-major pixels.
    /// Fails if the pixel count does not match `count * rows * cols`.
    pub fn new(pixels: Vec<u8>, count: usize, rows: usize, cols: usize) -> Result<Self> {
        ensure!(
            pixels.len() == count * rows * cols,
            "image batch has {} pixels, expected {} × {} × {} = {}",
            pixels.len(), count, rows, cols, count * rows * cols
        );
        Ok(Self { pixels, count, rows, cols })
    }

    /// Logical shape `[count, rows, cols]`
    pub fn shape(&self) -> [usize; 3] {
        [self.count, self.rows, self.cols]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of pixels in one image (rows × cols)
    pub fn image_size(&self) -> usize {
        self.rows * self.cols
    }

    /// Borrow the pixels of image `index`.
    /// Panics if `index >= len()`, like slice indexing.
    pub fn image(&self, index: usize) -> &[u8] {
        let size = self.image_size();
        &self.pixels[index * size..(index + 1) * size]
    }

    /// Iterate over every image in order
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact(0) would panic; an empty image means an empty batch
        self.pixels.chunks_exact(self.image_size().max(1)).take(self.count)
    }

    /// Keep only the first `n` images (no-op if `n >= len()`)
    pub fn take(mut self, n: usize) -> Self {
        if n < self.count {
            self.pixels.truncate(n * self.image_size());
            self.count = n;
        }
        self
    }

    /// Reshape to rank 4 by appending a single channel axis.
    pub fn to_nhwc(&self) -> NhwcImages<'_> {
        NhwcImages { batch: self }
    }
}

/// Rank-4 channel-last view of an [`ImageBatch`]: `count × rows × cols × 1`.
#[derive(Debug, Clone, Copy)]
pub struct NhwcImages<'a> {
    batch: &'a ImageBatch,
}

impl NhwcImages<'_> {
    /// Logical shape `[count, rows, cols, 1]`
    pub fn shape(&self) -> [usize; 4] {
        let [count, rows, cols] = self.batch.shape();
        [count, rows, cols, 1]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_batch() -> ImageBatch {
        // Two 2x3 images
        ImageBatch::new(vec![0, 1, 2, 3, 4, 5, 10, 11, 12, 13, 14, 255], 2, 2, 3).unwrap()
    }

    #[test]
    fn test_rejects_wrong_pixel_count() {
        assert!(ImageBatch::new(vec![0; 10], 2, 2, 3).is_err());
    }

    #[test]
    fn test_image_slices() {
        let b = tiny_batch();
        assert_eq!(b.shape(), [2, 2, 3]);
        assert_eq!(b.image(1), &[10, 11, 12, 13, 14, 255]);
        assert_eq!(b.iter().count(), 2);
    }

    #[test]
    fn test_nhwc_reshape_appends_channel() {
        let b = tiny_batch();
        let nhwc = b.to_nhwc();
        assert_eq!(nhwc.shape(), [2, 2, 3, 1]);
    }

    #[test]
    fn test_take_truncates() {
        let b = tiny_batch().take(1);
        assert_eq!(b.len(), 1);
        assert_eq!(b.shape(), [1, 2, 3]);
        // Asking for more than exists keeps everything
        assert_eq!(tiny_batch().take(9).len(), 2);
    }
}
