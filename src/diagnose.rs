//! Per-file diagnostics for photos that refuse to convert.
//!
//! Runs the same steps as a conversion but records what happened at each
//! one instead of stopping at the first error: file checks, extension,
//! container header, decode, and a JPEG encode held in memory. Nothing is
//! written to disk.
//!
//! Outside the container the default `/app/photos` usually does not exist;
//! [`resolve_photos_dir`] falls back to `./photos` so diagnosing a local
//! checkout needs no flags.

use crate::config::DEFAULT_PHOTOS_DIR;
use crate::convert::ConvertOptions;
use crate::imaging::sniff::{self, FileType};
use crate::imaging::{ImageCodec, flatten_to_rgb};
use crate::scan::{self, ScanError};
use image::ColorType;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnoseError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Fallback for the default photos directory, relative to the working directory.
pub const LOCAL_PHOTOS_DIR: &str = "photos";

/// Bytes of the file start shown in the report.
pub const HEADER_LEN: usize = 20;

/// A problem that stops diagnosis before the decode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    NotAFile,
    Empty,
    Unreadable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// Pixel layout libheif handed back, e.g. `Rgb8` or `Rgba8`.
    pub color: ColorType,
}

/// Findings for one file. Later fields stay empty once `problem` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub path: PathBuf,
    pub problem: Option<Problem>,
    pub size: Option<u64>,
    pub extension: Option<String>,
    pub heif_extension: bool,
    pub header: Vec<u8>,
    pub file_type: Option<FileType>,
    pub decode: Option<Result<ImageInfo, String>>,
    /// Size in bytes of the JPEG the converter would write.
    pub test_encode: Option<Result<usize, String>>,
}

impl Diagnosis {
    fn new(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        let heif_extension = extension.as_deref().is_some_and(scan::is_heif_extension);
        Self {
            path: path.to_path_buf(),
            problem: None,
            size: None,
            extension,
            heif_extension,
            header: Vec::new(),
            file_type: None,
            decode: None,
            test_encode: None,
        }
    }

    fn stop(mut self, problem: Problem) -> Self {
        self.problem = Some(problem);
        self
    }

    /// Whether `convert` would succeed on this file.
    pub fn is_convertible(&self) -> bool {
        self.problem.is_none() && matches!(self.test_encode, Some(Ok(_)))
    }
}

pub fn diagnose_file(codec: &impl ImageCodec, path: &Path, options: &ConvertOptions) -> Diagnosis {
    let diagnosis = Diagnosis::new(path);

    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return diagnosis.stop(Problem::Missing),
        Err(e) => return diagnosis.stop(Problem::Unreadable(e.to_string())),
    };
    if !meta.is_file() {
        return diagnosis.stop(Problem::NotAFile);
    }
    let mut diagnosis = Diagnosis {
        size: Some(meta.len()),
        ..diagnosis
    };
    if meta.len() == 0 {
        return diagnosis.stop(Problem::Empty);
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return diagnosis.stop(Problem::Unreadable(e.to_string())),
    };
    diagnosis.header = bytes[..bytes.len().min(HEADER_LEN)].to_vec();
    diagnosis.file_type = sniff::read_file_type(&bytes);

    let decoded = match codec.decode(&bytes) {
        Ok(img) => img,
        Err(e) => {
            diagnosis.decode = Some(Err(e.to_string()));
            return diagnosis;
        }
    };
    diagnosis.decode = Some(Ok(ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        has_alpha: decoded.color().has_alpha(),
        color: decoded.color(),
    }));

    let rgb = flatten_to_rgb(&decoded, options.background);
    diagnosis.test_encode = Some(
        codec
            .encode_jpeg(&rgb, &options.encode)
            .map(|jpeg| jpeg.len())
            .map_err(|e| e.to_string()),
    );
    diagnosis
}

/// The directory to diagnose: `configured`, unless it is the stock default,
/// missing, and `working_dir/photos` exists.
pub fn resolve_photos_dir(configured: &Path, working_dir: &Path) -> PathBuf {
    if configured == Path::new(DEFAULT_PHOTOS_DIR) && !configured.is_dir() {
        let local = working_dir.join(LOCAL_PHOTOS_DIR);
        if local.is_dir() {
            return local;
        }
    }
    configured.to_path_buf()
}

/// Diagnose every candidate in `directory`, in discovery order.
pub fn diagnose_directory(
    codec: &impl ImageCodec,
    directory: &Path,
    options: &ConvertOptions,
) -> Result<Vec<Diagnosis>, DiagnoseError> {
    Ok(scan::discover(directory)?
        .iter()
        .map(|task| diagnose_file(codec, &task.input, options))
        .collect())
}
