//! CLI output formatting for conversion runs and diagnostics.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Found 3 HEIC files to convert in /app/photos
//! [1/3] Converted: IMG_0001.heic -> IMG_0001.jpg
//! [2/3] JPEG already exists, skipping: IMG_0002.jpg
//! [3/3] Failed to convert IMG_0003.heic (decode): decode failed: ...
//! Conversion complete: 3 found, 1 converted, 1 skipped, 1 failed
//! ```
//!
//! ## Diagnose
//!
//! ```text
//! IMG_0001.heic
//!     Size: 1843210 bytes
//!     Extension: .heic
//!     Header (hex): 00000024667479706865696300000000...
//!     Header (ascii): ...$ftypheic....mif1
//!     Brand: heic (compatible: mif1, heic)
//!     HEIF markers: heic, mif1
//!     MIME: image/heic
//!     Decode: 4032x3024 (Rgb8)
//!     Test encode: 1254022 bytes
//!     Verdict: convertible
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability. Batch lines go through `tracing` via [`log_event`] so they
//! land in the log file too; diagnostics are printed to stdout.

use crate::convert::{BatchEvent, ConversionResult, FailureKind};
use crate::diagnose::{Diagnosis, Problem};
use crate::imaging::sniff;
use std::path::Path;
use tracing::{error, info};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn failure_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Decode => "decode",
        FailureKind::Encode => "encode",
        FailureKind::Unexpected => "unexpected",
    }
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Convert
// ============================================================================

/// Format one conversion outcome, without the progress prefix.
pub fn format_result(result: &ConversionResult) -> String {
    match result {
        ConversionResult::Converted { input, output } => {
            format!("Converted: {} -> {}", file_name(input), file_name(output))
        }
        ConversionResult::Skipped { output, .. } => {
            format!("JPEG already exists, skipping: {}", file_name(output))
        }
        ConversionResult::Failed {
            input,
            kind,
            message,
        } => format!(
            "Failed to convert {} ({}): {}",
            file_name(input),
            failure_label(*kind),
            message
        ),
    }
}

/// Format a single batch progress event as display lines.
pub fn format_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started {
            directory,
            candidates: 0,
        } => vec![format!("No HEIC files found in {}", directory.display())],
        BatchEvent::Started {
            directory,
            candidates,
        } => vec![format!(
            "Found {} HEIC files to convert in {}",
            candidates,
            directory.display()
        )],
        BatchEvent::FileFinished {
            index,
            total,
            result,
        } => vec![format!("[{}/{}] {}", index, total, format_result(result))],
        BatchEvent::Finished(summary) => vec![format!("Conversion complete: {}", summary)],
    }
}

/// Emit an event's lines through `tracing`. Failures log at ERROR.
pub fn log_event(event: &BatchEvent) {
    let failed = matches!(
        event,
        BatchEvent::FileFinished { result, .. } if result.is_failure()
    );
    for line in format_event(event) {
        if failed {
            error!("{}", line);
        } else {
            info!("{}", line);
        }
    }
}

// ============================================================================
// Diagnose
// ============================================================================

fn problem_text(problem: &Problem) -> String {
    match problem {
        Problem::Missing => "file not found".to_string(),
        Problem::NotAFile => "not a regular file".to_string(),
        Problem::Empty => "file is empty".to_string(),
        Problem::Unreadable(msg) => format!("cannot read file: {}", msg),
    }
}

/// Format a diagnosis as a header line plus indented findings.
pub fn format_diagnosis(d: &Diagnosis) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![d.path.display().to_string()];

    if let Some(size) = d.size {
        lines.push(format!("{}Size: {} bytes", pad, size));
    }

    let ext = match &d.extension {
        Some(ext) => format!(".{}", ext),
        None => "none".to_string(),
    };
    if d.heif_extension {
        lines.push(format!("{}Extension: {}", pad, ext));
    } else {
        lines.push(format!(
            "{}Extension: {} (warning: not a HEIC/HEIF extension)",
            pad, ext
        ));
    }

    if let Some(problem) = &d.problem {
        lines.push(format!("{}Problem: {}", pad, problem_text(problem)));
        lines.push(format!("{}Verdict: not convertible", pad));
        return lines;
    }

    lines.push(format!("{}Header (hex): {}", pad, sniff::hex(&d.header)));
    lines.push(format!("{}Header (ascii): {}", pad, sniff::ascii(&d.header)));

    match &d.file_type {
        Some(ft) => {
            lines.push(format!(
                "{}Brand: {} (compatible: {})",
                pad,
                ft.major_brand,
                ft.compatible_brands.join(", ")
            ));
            let markers = ft.heif_markers();
            if markers.is_empty() {
                lines.push(format!("{}HEIF markers: none", pad));
            } else {
                lines.push(format!("{}HEIF markers: {}", pad, markers.join(", ")));
            }
            lines.push(format!(
                "{}MIME: {}",
                pad,
                ft.mime_type().unwrap_or("unknown")
            ));
        }
        None => lines.push(format!("{}Container: no ftyp box found", pad)),
    }

    match &d.decode {
        Some(Ok(info)) => lines.push(format!(
            "{}Decode: {}x{} ({:?}){}",
            pad,
            info.width,
            info.height,
            info.color,
            if info.has_alpha { " with alpha" } else { "" }
        )),
        Some(Err(msg)) => lines.push(format!("{}Decode: {}", pad, msg)),
        None => {}
    }

    match &d.test_encode {
        Some(Ok(bytes)) => lines.push(format!("{}Test encode: {} bytes", pad, bytes)),
        Some(Err(msg)) => lines.push(format!("{}Test encode: {}", pad, msg)),
        None => {}
    }

    let verdict = if d.is_convertible() {
        "convertible"
    } else {
        "not convertible"
    };
    lines.push(format!("{}Verdict: {}", pad, verdict));
    lines
}

/// One-line tally for directory-mode diagnosis.
pub fn format_diagnosis_summary(all: &[Diagnosis]) -> String {
    let ok = all.iter().filter(|d| d.is_convertible()).count();
    format!(
        "Diagnosed {} files: {} convertible, {} not convertible",
        all.len(),
        ok,
        all.len() - ok
    )
}

/// Print a diagnosis to stdout.
pub fn print_diagnosis(d: &Diagnosis) {
    for line in format_diagnosis(d) {
        println!("{}", line);
    }
}
