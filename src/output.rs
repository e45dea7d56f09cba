//! CLI output formatting.
//!
//! The primary line for every command is the file itself (name, type, size);
//! details are indented beneath it so the output reads as a short report.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! photo.jpg (image/jpeg, 4.2 MiB)
//!     Policy: ok
//!     SHA-256: 3q2+7w...=
//! ```
//!
//! ## Optimize
//!
//! ```text
//! photo.jpg (image/jpeg, 6.0 MiB)
//!     resized: 3.0 MiB
//!     avif: 900.0 KiB  ← selected
//!     webp: 1.0 MiB
//! ```
//!
//! ## Upload
//!
//! ```text
//! [##########----------]  50%
//! Uploaded photo_resized.avif
//!     File ID: 42
//!     Key: uploads/2024/photo_resized.avif
//!     View: https://cdn.example.com/42
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::media::MediaFile;
use crate::policy::ValidationError;
use crate::select::Selection;
use crate::upload::UploadReceipt;
use std::io::Write;

const PROGRESS_WIDTH: usize = 20;

/// Human-readable byte count, binary units.
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// `name (type, size)` header shared by every command.
fn file_header(file: &MediaFile) -> String {
    format!(
        "{} ({}, {})",
        file.name(),
        file.content_type().unwrap_or("unknown type"),
        format_size(file.size())
    )
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(
    file: &MediaFile,
    validation: &Result<(), ValidationError>,
    checksum: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![file_header(file)];
    match validation {
        Ok(()) => lines.push("    Policy: ok".to_string()),
        Err(e) => lines.push(format!("    Policy: {e}")),
    }
    lines.push(format!(
        "    SHA-256: {}",
        checksum.unwrap_or("unavailable")
    ));
    lines
}

pub fn print_check(
    file: &MediaFile,
    validation: &Result<(), ValidationError>,
    checksum: Option<&str>,
) {
    for line in format_check(file, validation, checksum) {
        println!("{}", line);
    }
}

// ============================================================================
// Optimize
// ============================================================================

pub fn format_selection(original: &MediaFile, selection: &Selection) -> Vec<String> {
    let mut lines = vec![file_header(original)];
    for (label, size) in &selection.considered {
        let marker = if *label == selection.winner.label {
            "  ← selected"
        } else {
            ""
        };
        lines.push(format!("    {label}: {}{marker}", format_size(*size)));
    }
    lines
}

pub fn print_selection(original: &MediaFile, selection: &Selection) {
    for line in format_selection(original, selection) {
        println!("{}", line);
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Fixed-width progress bar, e.g. `[##########----------]  50%`.
pub fn format_progress(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = percent as usize * PROGRESS_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        percent
    )
}

/// Redraw the progress line in place.
pub fn print_progress(percent: u8) {
    print!("\r{}", format_progress(percent));
    if percent >= 100 {
        println!();
    }
    let _ = std::io::stdout().flush();
}

pub fn format_receipt(file: &MediaFile, receipt: &UploadReceipt) -> Vec<String> {
    vec![
        format!("Uploaded {}", file.name()),
        format!("    File ID: {}", receipt.file_id),
        format!("    Key: {}", receipt.key),
        format!("    View: {}", receipt.view_url),
    ]
}

pub fn print_receipt(file: &MediaFile, receipt: &UploadReceipt) {
    for line in format_receipt(file, receipt) {
        println!("{}", line);
    }
}
