//! Per-file conversion and the batch loop.
//!
//! [`convert_one`] classifies a single [`ConversionTask`] as converted,
//! skipped or failed. It never returns an error: every problem with one file
//! becomes a [`ConversionResult::Failed`] and the batch moves on.
//!
//! [`run_batch`] is the whole program minus the CLI: discover, convert each
//! task in order, count. The only error it returns is a directory that cannot
//! be scanned.
//!
//! ## Skip policy
//!
//! An existing output file is never touched. The check happens right before
//! each conversion, and the final write is a no-clobber rename from a temp
//! file in the same directory, so a JPEG that shows up mid-conversion still
//! wins. Re-running over a half-finished directory only converts what is
//! missing.
//!
//! A run killed mid-write can leave a `.heic-convert-*.tmp` file behind.
//! The next batch removes any such file older than [`STALE_TEMP_AGE`] before
//! converting.
//!
//! ## Progress events
//!
//! Callers pass an optional channel sender. The batch sends a [`BatchEvent`]
//! when discovery finishes, after each file, and at the end. The binary turns
//! these into log lines; tests collect them directly.

use crate::config::ConverterConfig;
use crate::imaging::{
    CodecError, DEFAULT_BACKGROUND, EncodeParams, ImageCodec, LibheifCodec, Quality,
    flatten_to_rgb,
};
use crate::scan::{self, ConversionTask, ScanError};
use crate::summary::RunSummary;
use image::Rgb;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};

const TEMP_PREFIX: &str = ".heic-convert-";
const TEMP_SUFFIX: &str = ".tmp";

/// Temp files younger than this may belong to a run still in progress.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("output appeared during conversion: {0}")]
    OutputAppeared(PathBuf),
}

impl ConvertError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::Codec(CodecError::Decode(_)) => FailureKind::Decode,
            ConvertError::Codec(CodecError::Encode(_)) | ConvertError::Write { .. } => {
                FailureKind::Encode
            }
            ConvertError::Read { .. } | ConvertError::OutputAppeared(_) => {
                FailureKind::Unexpected
            }
        }
    }
}

/// Which stage a failed file died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unreadable, corrupt or unsupported HEIF data.
    Decode,
    /// JPEG encoding or writing the output failed.
    Encode,
    /// Anything else, e.g. permission denied reading the input.
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OutputExists,
}

/// Outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    Converted {
        input: PathBuf,
        output: PathBuf,
    },
    Skipped {
        input: PathBuf,
        output: PathBuf,
        reason: SkipReason,
    },
    Failed {
        input: PathBuf,
        kind: FailureKind,
        message: String,
    },
}

impl ConversionResult {
    pub fn input(&self) -> &Path {
        match self {
            ConversionResult::Converted { input, .. }
            | ConversionResult::Skipped { input, .. }
            | ConversionResult::Failed { input, .. } => input,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ConversionResult::Failed { .. })
    }

    fn skipped(task: &ConversionTask) -> Self {
        ConversionResult::Skipped {
            input: task.input.clone(),
            output: task.output.clone(),
            reason: SkipReason::OutputExists,
        }
    }
}

/// Settings for the decode → flatten → encode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub encode: EncodeParams,
    /// Colour that transparent pixels are flattened onto.
    pub background: Rgb<u8>,
}

impl ConvertOptions {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            encode: EncodeParams {
                quality: Quality::new(config.jpeg.quality),
                optimize: config.jpeg.optimize,
            },
            background: Rgb(config.jpeg.background),
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            encode: EncodeParams::default(),
            background: DEFAULT_BACKGROUND,
        }
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Discovery finished.
    Started {
        directory: PathBuf,
        candidates: usize,
    },
    /// One task is done. `index` is 1-based.
    FileFinished {
        index: usize,
        total: usize,
        result: ConversionResult,
    },
    Finished(RunSummary),
}

/// Everything a run produced, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub directory: PathBuf,
    pub results: Vec<ConversionResult>,
    pub summary: RunSummary,
}

/// Convert one task, or decide not to.
pub fn convert_one(
    codec: &impl ImageCodec,
    task: &ConversionTask,
    options: &ConvertOptions,
) -> ConversionResult {
    if task.output.exists() {
        return ConversionResult::skipped(task);
    }

    match try_convert(codec, task, options) {
        Ok(()) => ConversionResult::Converted {
            input: task.input.clone(),
            output: task.output.clone(),
        },
        Err(ConvertError::OutputAppeared(_)) => ConversionResult::skipped(task),
        Err(e) => ConversionResult::Failed {
            input: task.input.clone(),
            kind: e.kind(),
            message: e.to_string(),
        },
    }
}

fn try_convert(
    codec: &impl ImageCodec,
    task: &ConversionTask,
    options: &ConvertOptions,
) -> Result<(), ConvertError> {
    let bytes = fs::read(&task.input).map_err(|source| ConvertError::Read {
        path: task.input.clone(),
        source,
    })?;

    let decoded = codec.decode(&bytes)?;
    debug!(
        input = %task.input.display(),
        width = decoded.width(),
        height = decoded.height(),
        alpha = decoded.color().has_alpha(),
        "decoded"
    );
    drop(bytes);

    let rgb = flatten_to_rgb(&decoded, options.background);
    drop(decoded);

    let jpeg = codec.encode_jpeg(&rgb, &options.encode)?;
    write_no_clobber(&task.output, &jpeg)
}

/// Write `bytes` to `path` through a sibling temp file, refusing to replace
/// anything already at `path`. The temp file is removed on every error path.
fn write_no_clobber(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let write_err = |source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    // temp files are created 0600; outputs should be as readable as a normal file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            ConvertError::OutputAppeared(path.to_path_buf())
        } else {
            write_err(e.error)
        }
    })?;
    Ok(())
}

/// Convert every HEIC/HEIF file in `directory` with the libheif codec.
pub fn run_batch(
    directory: &Path,
    options: &ConvertOptions,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, ScanError> {
    let codec = LibheifCodec::new();
    run_batch_with_codec(&codec, directory, options, events)
}

/// Batch loop with an explicit codec (allows testing with a mock).
pub fn run_batch_with_codec(
    codec: &impl ImageCodec,
    directory: &Path,
    options: &ConvertOptions,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, ScanError> {
    let tasks = scan::discover(directory)?;
    let swept = sweep_stale_temp_files(directory, STALE_TEMP_AGE);
    if swept > 0 {
        info!("Removed {} leftover temp file(s) from an earlier run", swept);
    }
    let total = tasks.len();
    emit(
        &events,
        BatchEvent::Started {
            directory: directory.to_path_buf(),
            candidates: total,
        },
    );

    let mut summary = RunSummary::new(total);
    let mut results = Vec::with_capacity(total);

    for (i, task) in tasks.iter().enumerate() {
        debug!(input = %task.input.display(), "converting");
        let result = convert_one(codec, task, options);
        summary.record(&result);
        emit(
            &events,
            BatchEvent::FileFinished {
                index: i + 1,
                total,
                result: result.clone(),
            },
        );
        results.push(result);
    }

    emit(&events, BatchEvent::Finished(summary));
    Ok(BatchReport {
        directory: directory.to_path_buf(),
        results,
        summary,
    })
}

/// Delete temp files left by an interrupted write that are older than
/// `min_age`. Returns how many were removed. Problems are logged, not raised.
pub fn sweep_stale_temp_files(directory: &Path, min_age: Duration) -> usize {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot look for leftover temp files in {}: {}", directory.display(), e);
            return 0;
        }
    };
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let age = meta
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if !meta.is_file() || age < min_age {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "removed stale temp file");
                removed += 1;
            }
            Err(e) => warn!("Cannot remove leftover temp file {}: {}", entry.path().display(), e),
        }
    }
    removed
}

fn emit(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // receiver gone means nobody is listening; the run itself goes on
        tx.send(event).ok();
    }
}
