use std::fs;
use std::path::{Path, PathBuf};

use deckscan_core::errors::{ErrorInfo, ScanError};

/// Number of entries allowed under any directory of the run hierarchy.
pub const FAN_OUT: u64 = 100;

/// Exponents of [`FAN_OUT`] used for the bucket levels, outermost first.
const BUCKET_EXPONENTS: [u32; 3] = [3, 2, 1];

/// Returns the four directory segments addressing run `index`.
///
/// The first three segments name the half-open buckets
/// `[start, start + 100^e)` for `e = 3, 2, 1`; the last is `run_<index>`.
pub fn run_dir_segments(index: u64) -> [String; 4] {
    let bucket = |exponent: u32| {
        let width = FAN_OUT.pow(exponent);
        let start = index / width * width;
        // u128 keeps the end bound exact for indices near u64::MAX.
        let end = u128::from(start) + u128::from(width);
        format!("run_{start}_{end}")
    };
    [
        bucket(BUCKET_EXPONENTS[0]),
        bucket(BUCKET_EXPONENTS[1]),
        bucket(BUCKET_EXPONENTS[2]),
        format!("run_{index}"),
    ]
}

/// Pure address computation: `root` joined with [`run_dir_segments`].
pub fn run_dir_path(root: &Path, index: u64) -> PathBuf {
    run_dir_segments(index)
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Computes the run directory for `index` and creates it with all missing
/// ancestors. Succeeds when the directory already exists.
pub fn ensure_run_dir(root: &Path, index: u64) -> Result<PathBuf, ScanError> {
    let path = run_dir_path(root, index);
    fs::create_dir_all(&path).map_err(|err| ScanError::io("run-dir-create", &path, err))?;
    Ok(path)
}

/// Converts a signed run index, rejecting negative values.
pub fn run_index_from_signed(index: i64) -> Result<u64, ScanError> {
    u64::try_from(index).map_err(|_| {
        ScanError::Address(
            ErrorInfo::new("run-index-negative", "run indices must be non-negative")
                .with_context("index", index.to_string()),
        )
    })
}
