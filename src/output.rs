//! CLI output formatting for the batch stages.
//!
//! # Item Display
//!
//! Every batch item leads with its 1-based positional index and the name of
//! its target image. The text line it carries, failure reasons and progress
//! counters are secondary context on the same line or indented below it.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Sample
//!     beach.jpg (1200x800, landscape)
//! Export
//!     png at 180 DPI, canvas 2126x1488
//!     Package: processed_images.zip
//! Pairs (2)
//!     001 a.jpg "שלום"
//!     002 b.jpg "Hello"
//! Ignored
//!     1 image without a text line
//! Font
//!     David: unavailable, falls back to sans-serif
//! ```
//!
//! ## Process
//!
//! ```text
//! Rendering 2 images
//!     001 a.jpg [1/2]
//!     002 b.jpg [2/2] FAILED
//!         Reason: failed to decode image: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Rendered 1 of 2 images, 1 failed
//! Wrote out/processed_images.zip
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::geometry::Dimensions;
use crate::imaging::{ExportFormat, ExportSpec, Orientation};
use crate::process::{BatchOutcome, ProcessEvent};
use std::path::Path;

/// Longest text preview shown for a pair, in characters.
const TEXT_PREVIEW_CHARS: usize = 40;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn orientation_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
    }
}

fn package_name(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Pdf => crate::package::PDF_FILE_NAME,
        ExportFormat::Png | ExportFormat::Jpg => crate::package::ZIP_FILE_NAME,
    }
}

fn ignored_lines(ignored_images: usize, ignored_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if ignored_images > 0 {
        lines.push(format!(
            "{}{} without a text line",
            indent(1),
            plural(ignored_images, "image")
        ));
    }
    if ignored_lines > 0 {
        lines.push(format!(
            "{}{} without an image",
            indent(1),
            plural(ignored_lines, "text line")
        ));
    }
    lines
}

// ============================================================================
// Check output
// ============================================================================

/// Everything `check` reports about a planned batch.
#[derive(Debug, Clone)]
pub struct CheckSummary<'a> {
    pub sample_name: &'a str,
    pub design: Dimensions,
    pub export: ExportSpec,
    /// `(image name, text line)` per item, in batch order.
    pub pairs: Vec<(String, &'a str)>,
    pub ignored_images: usize,
    pub ignored_lines: usize,
    pub font_family: &'a str,
    /// Registered family the requested font resolves to, if any.
    pub resolved_font: Option<String>,
}

pub fn format_check_output(summary: &CheckSummary) -> Vec<String> {
    let mut lines = vec![
        "Sample".to_string(),
        format!(
            "{}{} ({}, {})",
            indent(1),
            summary.sample_name,
            summary.design,
            orientation_name(summary.export.orientation)
        ),
        "Export".to_string(),
        format!(
            "{}{} at {} DPI, canvas {}",
            indent(1),
            summary.export.format.extension(),
            summary.export.resolution.dpi(),
            summary.export.canvas()
        ),
    ];
    if summary.export.format == ExportFormat::Jpg {
        lines.push(format!(
            "{}Quality: {}",
            indent(1),
            summary.export.quality.value()
        ));
    }
    lines.push(format!(
        "{}Package: {}",
        indent(1),
        package_name(summary.export.format)
    ));

    lines.push(format!("Pairs ({})", summary.pairs.len()));
    for (i, (name, text)) in summary.pairs.iter().enumerate() {
        lines.push(format!(
            "{}{} {} \"{}\"",
            indent(1),
            format_index(i + 1),
            name,
            truncate_text(text, TEXT_PREVIEW_CHARS)
        ));
    }

    let ignored = ignored_lines(summary.ignored_images, summary.ignored_lines);
    if !ignored.is_empty() {
        lines.push("Ignored".to_string());
        lines.extend(ignored);
    }

    lines.push("Font".to_string());
    match &summary.resolved_font {
        Some(family) if family == summary.font_family => {
            lines.push(format!("{}{}: available", indent(1), summary.font_family));
        }
        Some(family) => lines.push(format!(
            "{}{}: available as {}",
            indent(1),
            summary.font_family,
            family
        )),
        None => lines.push(format!(
            "{}{}: unavailable, falls back to {}",
            indent(1),
            summary.font_family,
            crate::imaging::fonts::FALLBACK_FAMILY
        )),
    }
    lines
}

pub fn print_check_output(summary: &CheckSummary) {
    for line in format_check_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            total,
            ignored_images,
            ignored_lines: ignored_text,
        } => {
            let mut lines = vec![format!("Rendering {}", plural(*total, "image"))];
            let ignored = ignored_lines(*ignored_images, *ignored_text);
            if !ignored.is_empty() {
                lines.push(format!("{}Ignored:", indent(1)));
                lines.extend(ignored.into_iter().map(|l| format!("{}{}", indent(1), l)));
            }
            lines
        }
        ProcessEvent::ItemDone {
            index,
            name,
            done,
            total,
        } => vec![format!(
            "{}{} {} [{}/{}]",
            indent(1),
            format_index(index + 1),
            name,
            done,
            total
        )],
        ProcessEvent::ItemFailed {
            index,
            name,
            reason,
            done,
            total,
        } => vec![
            format!(
                "{}{} {} [{}/{}] FAILED",
                indent(1),
                format_index(index + 1),
                name,
                done,
                total
            ),
            format!("{}Reason: {}", indent(2), reason),
        ],
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Final lines after a batch: counts, failures, and where the package went.
pub fn format_batch_summary(outcome: &BatchOutcome, written: Option<&Path>) -> Vec<String> {
    let done = outcome.results.len();
    let mut headline = format!(
        "Rendered {} of {}",
        done,
        plural(outcome.total, "image")
    );
    if !outcome.failures.is_empty() {
        headline.push_str(&format!(", {} failed", outcome.failures.len()));
    }
    if outcome.cancelled {
        headline.push_str(" (cancelled)");
    }
    let mut lines = vec![headline];

    if !outcome.failures.is_empty() {
        lines.push("Failed".to_string());
        for failure in &outcome.failures {
            lines.push(format!(
                "{}{} {}: {}",
                indent(1),
                format_index(failure.index + 1),
                failure.source,
                failure.reason
            ));
        }
    }

    match written {
        Some(path) => lines.push(format!("Wrote {}", path.display())),
        None => lines.push("Nothing written".to_string()),
    }
    lines
}

pub fn print_batch_summary(outcome: &BatchOutcome, written: Option<&Path>) {
    for line in format_batch_summary(outcome, written) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
