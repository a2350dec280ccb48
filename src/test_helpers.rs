//! Shared test utilities.
//!
//! Fixture writers for the mock codec, real HEIC fixtures, and directory
//! assertions used by the codec, convert and diagnose test modules.
//!
//! `fixtures/photos/` holds two real HEVC-coded HEIC files, 30x20, whose
//! rows are narrower than libheif's plane stride:
//!
//! - `opaque.heic`: red rises left to right, green top to bottom, blue ~128
//! - `alpha.heic`: same colours; left half opaque, right half fully transparent

use crate::imaging::backend::tests::mock_heif_bytes;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a file the [`MockCodec`](crate::imaging::backend::tests::MockCodec)
/// decodes into a `width`×`height` image.
pub fn write_mock_heic(dir: &Path, name: &str, width: u16, height: u16, alpha: bool) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, mock_heif_bytes(width, height, alpha)).unwrap();
    path
}

/// Sorted names of everything directly inside `dir`, temp files included.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Path of a file in `fixtures/photos/`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/photos")
        .join(name)
}

/// Copy a fixture into `dir` and return the copy's path.
pub fn copy_fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::copy(fixture_path(name), &path).unwrap();
    path
}
