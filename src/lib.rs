//! # textstamp
//!
//! Stamp one line of text per image onto a batch of photos, at print
//! resolution. A text box is designed once against a sample image; every
//! target image is then letterboxed onto a fixed print canvas and receives
//! its own line of text at the same relative position and style.
//!
//! # Architecture: Three Coordinate Spaces
//!
//! ```text
//! design   sample image pixels     ← the text box lives here
//! preview  on-screen image box     ← pointer input arrives here
//! export   print canvas pixels     ← every batch item renders here
//! ```
//!
//! The text box is stored only in design space. Preview and export
//! positions are derived on demand by [`geometry`], so resizing the preview
//! or changing the export preset never disturbs the design.
//!
//! # Batch Flow
//!
//! ```text
//! sample + layout  →  RenderPlan       (design size, text box, export preset)
//! images + lines   →  BatchJob         (pair i with i, surplus ignored)
//! run_batch        →  BatchOutcome     (rasters in order, failures recorded)
//! package          →  ZIP or PDF
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Text box model, clamping, contain fit and space conversions |
//! | [`interaction`] | Pointer gestures that move and resize the box in preview space |
//! | [`imaging`] | Background fitting, SVG text layer, encoding, font catalog |
//! | [`process`] | Sequential batch over image/text pairs with progress and cancellation |
//! | [`package`] | ZIP of numbered files or a multi-page PDF |
//! | [`input`] | Text-line files and target-image discovery |
//! | [`config`] | Layout file loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Fixed Print Canvases
//!
//! Exports always land on one of two portrait canvases (1488 × 2126 at
//! 180 DPI, 2480 × 3543 at 300 DPI), swapped for landscape samples. Target
//! images are contain-fitted, never cropped, so the bars around a
//! differently shaped photo are part of the output: transparent in PNG,
//! white in JPEG and PDF.
//!
//! ## Text as SVG
//!
//! The text layer is an SVG document rasterized with resvg. Shaping,
//! right-to-left runs and font fallback come from the same engine that
//! draws outlines and shadows, and the outline is painted in its own pass
//! underneath the fill so it never eats into the glyphs.
//!
//! ## One Item at a Time
//!
//! Print canvases are large. The batch renders strictly sequentially and
//! keeps only encoded results, so peak memory is one decoded background
//! plus one canvas regardless of batch size.

pub mod config;
pub mod geometry;
pub mod imaging;
pub mod input;
pub mod interaction;
pub mod logging;
pub mod output;
pub mod package;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
