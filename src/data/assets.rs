use std::path::{Path, PathBuf};

use anyhow::Result;

/// Model filenames the detector tries, in preference order. The quantized
/// variant is roughly a quarter of the full model's size and measurably
/// faster on mobile-class CPUs, so it wins when both are present.
pub const MODEL_CANDIDATES: [&str; 2] =
    ["comictextdetector_quantized.onnx", "comictextdetector.pt.onnx"];

/// Resolves model binaries by filename.
///
/// Absence of every candidate is a normal condition (the detector reports
/// `NotAvailable`), so `fetch` distinguishes "not there" (`Ok(None)`) from an
/// actual read failure.
pub trait ModelAssets: Send + Sync {
    fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>>;
}

/// Serves model files out of a plain directory.
#[derive(Debug, Clone)]
pub struct DirAssets {
    dir: PathBuf,
}

impl DirAssets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ModelAssets for DirAssets {
    fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }
}
