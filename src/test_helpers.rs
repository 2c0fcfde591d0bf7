//! Shared test utilities for the textstamp test suite.
//!
//! Builds synthetic encoded images in memory and lays out input directories
//! the way a user would hand them to the CLI.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_inputs(&[("1.png", png_bytes(40, 20)), ("2.jpg", jpeg_bytes(40, 20))]);
//! write_text(tmp.path(), "lines.txt", "first\r\nsecond\n");
//! ```

use image::{ImageEncoder, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Opaque RGB PNG with a gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Baseline JPEG with a gradient.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Bytes with an image extension that no decoder accepts.
pub fn corrupt_bytes() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nthis is not really a png".to_vec()
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Temp directory holding the given files.
pub fn setup_inputs(files: &[(&str, Vec<u8>)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, bytes) in files {
        std::fs::write(tmp.path().join(name), bytes).unwrap();
    }
    tmp
}

pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
