//! # heic-convert
//!
//! Batch converter for a single directory of iPhone photos: every `.heic` or
//! `.heif` file gets a `.jpg` sibling with the same stem. Files that already
//! have a JPEG are left alone, so the tool can be re-run over the same
//! directory as often as needed.
//!
//! # Architecture: One Pass, Three Steps
//!
//! ```text
//! 1. Scan      photos/     →  Vec<ConversionTask>   (candidates, sorted)
//! 2. Convert   each task   →  ConversionResult      (converted / skipped / failed)
//! 3. Summary   results     →  RunSummary            (counts, logged at the end)
//! ```
//!
//! A failure on one file never stops the batch. The only fatal error is a
//! directory that cannot be scanned.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists the directory and pairs each HEIC/HEIF input with its JPEG output path |
//! | [`convert`] | Per-file conversion with skip policy, the batch loop, progress events |
//! | [`summary`] | Run counters and the final summary line |
//! | [`imaging`] | `ImageCodec` trait, libheif decoding, JPEG encoding, alpha flattening, `ftyp` sniffing |
//! | [`diagnose`] | Step-by-step report for files that refuse to convert |
//! | [`config`] | `heic-convert.toml` loading, merging onto defaults, CLI overrides, validation |
//! | [`logging`] | `tracing` subscriber writing to stdout and an append-only log file |
//! | [`output`] | CLI output formatting for batch events and diagnoses |
//!
//! # Design Decisions
//!
//! ## Never Overwrite
//!
//! An existing `<stem>.jpg` is treated as done, whoever made it. Outputs are
//! written to a temp file in the same directory and moved into place with a
//! no-clobber rename, so an interrupted run leaves no half-written JPEGs and
//! a JPEG created by someone else mid-run is not replaced.
//!
//! ## Codec Behind a Trait
//!
//! Decoding and encoding go through [`imaging::ImageCodec`]. Production uses
//! [`imaging::LibheifCodec`] (libheif for HEIF, `jpeg-encoder` for output);
//! unit tests use a recording mock for conversion logic, and a pair of small
//! real HEIC files in `fixtures/photos/` for the libheif path.
//!
//! ## Progress as Events
//!
//! The batch loop does not log outcomes itself. It sends [`convert::BatchEvent`]s
//! on an optional channel; the binary turns them into log lines on a printer
//! thread, and tests collect them directly.
//!
//! ## Sequential on Purpose
//!
//! Files are converted one at a time in file-name order, so at most one
//! decoded frame is held in memory and the log reads in directory order.

pub mod config;
pub mod convert;
pub mod diagnose;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod scan;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_helpers;
