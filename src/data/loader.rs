// ============================================================
// Layer 4: MNIST Loader
// ============================================================
// Reads MNIST from the IDX files it is distributed as.
//
// IDX layout (all integers big-endian u32):
//
//   images file                labels file
//   ┌───────────────┐          ┌───────────────┐
//   │ magic = 2051  │          │ magic = 2049  │
//   │ count         │          │ count         │
//   │ rows          │          │ label bytes…  │
//   │ cols          │          └───────────────┘
//   │ pixel bytes…  │
//   └───────────────┘
//
// Files may be stored plain or gzip-compressed (.gz). Gzip is
// detected from the two magic bytes 0x1f 0x8b, so a renamed
// file still loads.
//
// If the IDX files are not present, `source_for` falls back to
// burn's MnistDataset, which downloads and caches the dataset.
//
// Reference: Rust Book §9 (Error Handling)
//            flate2 crate documentation

use anyhow::{bail, ensure, Context, Result};
use flate2::read::GzDecoder;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use crate::domain::{
    images::ImageBatch,
    labels::LabelVector,
    split::{DigitSplit, SplitKind},
    traits::DigitSource,
    IMAGE_SIDE,
};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Canonical file stems for (images, labels) of a split
fn file_stems(kind: SplitKind) -> (&'static str, &'static str) {
    match kind {
        SplitKind::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
        SplitKind::Test  => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
    }
}

// ─── IdxDirectory ─────────────────────────────────────────────────────────────
/// A directory holding the four MNIST IDX files.
pub struct IdxDirectory {
    dir: PathBuf,
}

impl IdxDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// True if both files of every split can be found
    pub fn is_complete(&self) -> bool {
        [SplitKind::Train, SplitKind::Test].iter().all(|&kind| {
            let (images, labels) = file_stems(kind);
            self.locate(images).is_some() && self.locate(labels).is_some()
        })
    }

    /// Find `stem` or `stem.gz` inside the directory
    fn locate(&self, stem: &str) -> Option<PathBuf> {
        let plain = self.dir.join(stem);
        if plain.is_file() {
            return Some(plain);
        }
        let gz = self.dir.join(format!("{stem}.gz"));
        gz.is_file().then_some(gz)
    }

    fn require(&self, stem: &str) -> Result<PathBuf> {
        self.locate(stem).with_context(|| {
            format!("'{stem}' (or '{stem}.gz') not found in '{}'", self.dir.display())
        })
    }
}

impl DigitSource for IdxDirectory {
    fn describe(&self) -> String {
        format!("IDX files in '{}'", self.dir.display())
    }

    fn load(&self, kind: SplitKind) -> Result<DigitSplit> {
        let (image_stem, label_stem) = file_stems(kind);
        let image_path = self.require(image_stem)?;
        let label_path = self.require(label_stem)?;

        let images = parse_idx_images(&read_idx_bytes(&image_path)?)
            .with_context(|| format!("Invalid image file '{}'", image_path.display()))?;
        let labels = parse_idx_labels(&read_idx_bytes(&label_path)?)
            .with_context(|| format!("Invalid label file '{}'", label_path.display()))?;

        tracing::debug!(
            "Read {} split: images {:?}, {} labels",
            kind,
            images.shape(),
            labels.len()
        );

        DigitSplit::new(images, labels)
            .with_context(|| format!("Mismatched {kind} split in '{}'", self.dir.display()))
    }
}

/// Read a file, transparently gunzipping it if needed.
pub fn read_idx_bytes(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("Cannot read '{}'", path.display()))?;
    if raw.starts_with(&GZIP_MAGIC) {
        let mut bytes = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut bytes)
            .with_context(|| format!("Cannot decompress '{}'", path.display()))?;
        Ok(bytes)
    } else {
        Ok(raw)
    }
}

/// Read the big-endian u32 at header slot `slot`
fn header_u32(bytes: &[u8], slot: usize) -> Result<u32> {
    let start = slot * 4;
    let Some(word) = bytes.get(start..start + 4) else {
        bail!("truncated header: {} bytes", bytes.len());
    };
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

/// Parse an IDX3 image file into a rank-3 batch.
pub fn parse_idx_images(bytes: &[u8]) -> Result<ImageBatch> {
    let magic = header_u32(bytes, 0)?;
    ensure!(magic == IMAGES_MAGIC, "bad magic number {magic}, expected {IMAGES_MAGIC}");

    let count = header_u32(bytes, 1)? as usize;
    let rows  = header_u32(bytes, 2)? as usize;
    let cols  = header_u32(bytes, 3)? as usize;
    ensure!(
        rows == IMAGE_SIDE && cols == IMAGE_SIDE,
        "images are {rows}×{cols}, expected {IMAGE_SIDE}×{IMAGE_SIDE}"
    );

    let payload  = &bytes[16..];
    let expected = count * rows * cols;
    ensure!(
        payload.len() >= expected,
        "truncated payload: {} bytes for {count} images ({expected} expected)",
        payload.len()
    );

    ImageBatch::new(payload[..expected].to_vec(), count, rows, cols)
}

/// Parse an IDX1 label file.
pub fn parse_idx_labels(bytes: &[u8]) -> Result<LabelVector> {
    let magic = header_u32(bytes, 0)?;
    ensure!(magic == LABELS_MAGIC, "bad magic number {magic}, expected {LABELS_MAGIC}");

    let count   = header_u32(bytes, 1)? as usize;
    let payload = &bytes[8..];
    ensure!(
        payload.len() >= count,
        "truncated payload: {} labels for a declared count of {count}",
        payload.len()
    );

    LabelVector::new(payload[..count].to_vec())
}

// ─── DownloadedMnist ──────────────────────────────────────────────────────────
/// MNIST fetched through burn's vision dataset (downloaded on first
/// use and cached under the user's cache directory).
pub struct DownloadedMnist;

impl DigitSource for DownloadedMnist {
    fn describe(&self) -> String {
        "burn's cached MNIST download".to_string()
    }

    fn load(&self, kind: SplitKind) -> Result<DigitSplit> {
        use burn::data::dataset::{vision::MnistDataset, Dataset};

        let dataset = match kind {
            SplitKind::Train => MnistDataset::train(),
            SplitKind::Test  => MnistDataset::test(),
        };

        let count      = dataset.len();
        let mut pixels = Vec::with_capacity(count * IMAGE_SIDE * IMAGE_SIDE);
        let mut labels = Vec::with_capacity(count);

        for item in dataset.iter() {
            // burn stores the raw 0–255 intensities as f32
            pixels.extend(
                item.image
                    .iter()
                    .flat_map(|row| row.iter().map(|&p| p.round().clamp(0.0, 255.0) as u8)),
            );
            labels.push(item.label);
        }

        let images = ImageBatch::new(pixels, count, IMAGE_SIDE, IMAGE_SIDE)?;
        DigitSplit::new(images, LabelVector::new(labels)?)
    }
}

/// Pick the local IDX directory when it is complete, otherwise the download.
pub fn source_for(dir: impl Into<PathBuf>) -> Box<dyn DigitSource> {
    let idx = IdxDirectory::new(dir);
    if idx.is_complete() {
        Box::new(idx)
    } else {
        tracing::warn!(
            "MNIST IDX files not found in '{}', falling back to download",
            idx.dir.display()
        );
        Box::new(DownloadedMnist)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    /// Encode images as an IDX3 file (used by tests across the crate)
    pub(crate) fn idx_images(images: &[[u8; IMAGE_SIDE * IMAGE_SIDE]]) -> Vec<u8> {
        let mut out = Vec::new();
        for word in [IMAGES_MAGIC, images.len() as u32, IMAGE_SIDE as u32, IMAGE_SIDE as u32] {
            out.extend_from_slice(&word.to_be_bytes());
        }
        for img in images {
            out.extend_from_slice(img);
        }
        out
    }

    /// Encode labels as an IDX1 file
    pub(crate) fn idx_labels(labels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
        out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        out.extend_from_slice(labels);
        out
    }

    /// Write a complete MNIST directory with `n` train and `n` test images.
    /// Image `i` is filled with the value `i * 20` and labelled `i % 10`.
    pub(crate) fn write_fake_mnist(dir: &Path, n: usize) {
        let images: Vec<[u8; IMAGE_SIDE * IMAGE_SIDE]> =
            (0..n).map(|i| [(i * 20 % 256) as u8; IMAGE_SIDE * IMAGE_SIDE]).collect();
        let labels: Vec<u8> = (0..n).map(|i| (i % 10) as u8).collect();
        for kind in [SplitKind::Train, SplitKind::Test] {
            let (img, lbl) = file_stems(kind);
            fs::write(dir.join(img), idx_images(&images)).unwrap();
            fs::write(dir.join(lbl), idx_labels(&labels)).unwrap();
        }
    }

    #[test]
    fn test_parse_images_header() {
        let bytes = idx_images(&[[7; IMAGE_SIDE * IMAGE_SIDE], [9; IMAGE_SIDE * IMAGE_SIDE]]);
        let batch = parse_idx_images(&bytes).unwrap();
        assert_eq!(batch.shape(), [2, 28, 28]);
        assert!(batch.image(1).iter().all(|&p| p == 9));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = idx_images(&[[0; IMAGE_SIDE * IMAGE_SIDE]]);
        bytes[3] = 0; // corrupt the low byte of the magic
        assert!(parse_idx_images(&bytes).is_err());
        // A label file is not an image file
        assert!(parse_idx_images(&idx_labels(&[1, 2])).is_err());
    }

    #[test]
    fn test_truncated_files_rejected() {
        let bytes = idx_images(&[[0; IMAGE_SIDE * IMAGE_SIDE]]);
        assert!(parse_idx_images(&bytes[..bytes.len() - 1]).is_err());
        assert!(parse_idx_images(&bytes[..6]).is_err());

        let labels = idx_labels(&[1, 2, 3]);
        assert!(parse_idx_labels(&labels[..labels.len() - 1]).is_err());
    }

    #[test]
    fn test_label_out_of_range_rejected() {
        assert!(parse_idx_labels(&idx_labels(&[1, 12])).is_err());
    }

    #[test]
    fn test_reads_gzip_and_plain() {
        let dir = tempfile::tempdir().unwrap();
        let labels = idx_labels(&[4, 2]);

        let plain = dir.path().join("plain");
        fs::write(&plain, &labels).unwrap();

        let gz = dir.path().join("packed.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&labels).unwrap();
        fs::write(&gz, enc.finish().unwrap()).unwrap();

        assert_eq!(read_idx_bytes(&plain).unwrap(), labels);
        assert_eq!(read_idx_bytes(&gz).unwrap(), labels);
    }

    #[test]
    fn test_directory_source_loads_both_splits() {
        let dir = tempfile::tempdir().unwrap();
        write_fake_mnist(dir.path(), 4);

        let source = IdxDirectory::new(dir.path());
        assert!(source.is_complete());

        let train = source.load(SplitKind::Train).unwrap();
        assert_eq!(train.len(), 4);
        assert_eq!(train.labels.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(source.load(SplitKind::Test).unwrap().len(), 4);
    }

    #[test]
    fn test_incomplete_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train-images-idx3-ubyte"), idx_images(&[])).unwrap();
        let source = IdxDirectory::new(dir.path());
        assert!(!source.is_complete());
        assert!(source.load(SplitKind::Train).is_err());
    }
}
