//! Candidate discovery.
//!
//! Lists the immediate entries of the photos directory and turns every
//! HEIC/HEIF file into a [`ConversionTask`]. The scan is non-recursive and
//! never looks inside files; the extension alone decides.
//!
//! ```text
//! photos/
//! ├── IMG_0001.HEIC     → task, output IMG_0001.jpg
//! ├── IMG_0002.heif     → task, output IMG_0002.jpg
//! ├── IMG_0003.jpg      ignored
//! ├── notes.txt         ignored
//! └── old.heic/         ignored (directory)
//! ```
//!
//! Tasks come back sorted by file name so runs and logs are reproducible.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Recognized input extensions, compared ASCII case-insensitively.
pub const HEIF_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Extension given to every output file.
pub const OUTPUT_EXTENSION: &str = "jpg";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Photos directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Photos path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot read photos directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One candidate file and where its JPEG goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Extension as found on disk, original case.
    pub extension: String,
}

impl ConversionTask {
    /// Build a task for `input`, or `None` if it doesn't carry a HEIF extension.
    pub fn for_input(input: PathBuf) -> Option<Self> {
        let extension = input.extension()?.to_str()?.to_string();
        if !is_heif_extension(&extension) {
            return None;
        }
        let output = output_path_for(&input);
        Some(Self {
            input,
            output,
            extension,
        })
    }
}

pub fn is_heif_extension(ext: &str) -> bool {
    HEIF_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// `dir/IMG_0001.HEIC` → `dir/IMG_0001.jpg`. Depends on the path only.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// List HEIC/HEIF files directly inside `directory`.
pub fn discover(directory: &Path) -> Result<Vec<ConversionTask>, ScanError> {
    let unreadable = |source| ScanError::Unreadable {
        path: directory.to_path_buf(),
        source,
    };

    match fs::metadata(directory) {
        Ok(meta) if !meta.is_dir() => {
            return Err(ScanError::NotADirectory(directory.to_path_buf()));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ScanError::DirectoryNotFound(directory.to_path_buf()));
        }
        Err(e) => return Err(unreadable(e)),
    }

    let directory = std::path::absolute(directory).map_err(unreadable)?;
    let entries = fs::read_dir(&directory).map_err(unreadable)?;
    let mut tasks: Vec<ConversionTask> = readable_entries(&directory, entries)
        .into_iter()
        .map(|e| e.path())
        // is_file follows symlinks, so a link to a photo counts
        .filter(|p| p.is_file())
        .filter_map(ConversionTask::for_input)
        .collect();

    tasks.sort_by(|a, b| a.input.file_name().cmp(&b.input.file_name()));
    Ok(tasks)
}

/// Keep the entries that could be read; warn about the rest and move on.
fn readable_entries<T>(directory: &Path, entries: impl Iterator<Item = io::Result<T>>) -> Vec<T> {
    entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                None
            }
        })
        .collect()
}
