// ============================================================
// Layer 4: Pixel Normaliser
// ============================================================
// Converts raw u8 intensities (0–255) into the f32 values the
// network trains on. The default scale maps 0 → 0.0 and
// 255 → 1.0, matching `x_train.astype('float32') / 255`.
//
// Reference: Rust Book §13 (Iterators)

/// Scales u8 pixels into floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    scale: f32,
}

impl Normalizer {
    /// The standard [0, 1] normaliser
    pub fn new() -> Self {
        Self { scale: 1.0 / 255.0 }
    }

    /// Normalise `pixels` and append them to `out`, so a whole
    /// batch is built in one buffer.
    pub fn extend_into(&self, pixels: &[u8], out: &mut Vec<f32>) {
        out.extend(pixels.iter().map(|&p| p as f32 * self.scale));
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn normalise(pixels: &[u8]) -> Vec<f32> {
        let mut out = Vec::new();
        Normalizer::new().extend_into(pixels, &mut out);
        out
    }

    #[test]
    fn test_maps_extremes() {
        let out = normalise(&[0, 255]);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_values_in_unit_range() {
        let pixels: Vec<u8> = (0..=255).collect();
        assert!(normalise(&pixels).iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_extend_appends_after_existing_values() {
        let mut buf = vec![9.0];
        Normalizer::default().extend_into(&[0, 51], &mut buf);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf[0], 9.0);
        assert!((buf[2] - 0.2).abs() < 1e-6);
    }
}
