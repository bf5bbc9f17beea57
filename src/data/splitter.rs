// ============================================================
// Layer 4: Train/Validation Splitter
// ============================================================
// Only used with --validation-split. Without it the test split
// is the per-epoch validation set, so nothing is held out.
//
// With it, the 60 000 training images are shuffled with a
// seeded StdRng and the tail fraction becomes the hold-out:
//
//   --validation-split 0.1  →  54 000 train / 6 000 validation
//
// The test split then stays untouched until the final evaluation.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seeded shuffle, then cut into (train, validation).
///
/// `train_fraction` is clamped to [0, 1].
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(&mut StdRng::seed_from_u64(seed));

    let total   = samples.len();
    let n_train = (total as f64 * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let valid   = samples.split_off(n_train.min(total));

    tracing::debug!(
        "Hold-out split (seed {}): {} train / {} validation",
        seed,
        samples.len(),
        valid.len()
    );

    (samples, valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::DigitSample;

    fn digits(n: usize) -> Vec<DigitSample> {
        (0..n).map(|i| DigitSample { pixels: vec![i as u8], label: (i % 10) as u8 }).collect()
    }

    #[test]
    fn test_tenth_held_out() {
        let (train, valid) = split_train_val(digits(60), 0.9, 42);
        assert_eq!((train.len(), valid.len()), (54, 6));
    }

    #[test]
    fn test_no_sample_lost_or_duplicated() {
        let (train, valid) = split_train_val(digits(37), 0.75, 3);
        let mut ids: Vec<u8> = train.iter().chain(&valid).map(|s| s.pixels[0]).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..37).collect::<Vec<u8>>());
    }

    #[test]
    fn test_seed_controls_order() {
        let order = |seed| {
            let (train, _) = split_train_val(digits(30), 0.5, seed);
            train.into_iter().map(|s| s.pixels[0]).collect::<Vec<_>>()
        };
        assert_eq!(order(7), order(7));
        assert_ne!(order(7), order(8));
    }

    #[test]
    fn test_edge_fractions() {
        let (train, valid) = split_train_val(digits(10), 1.5, 1);
        assert_eq!((train.len(), valid.len()), (10, 0));

        let (train, valid) = split_train_val(digits(10), -0.2, 1);
        assert_eq!((train.len(), valid.len()), (0, 10));

        let (train, valid) = split_train_val(Vec::<DigitSample>::new(), 0.9, 1);
        assert!(train.is_empty() && valid.is_empty());
    }
}
