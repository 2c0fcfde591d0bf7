//! Export parameters: print presets, output formats, encoding quality.
//!
//! These types describe *what* the rasterizer should produce. They carry no
//! pixels and do no I/O, so the pipeline and packager can reason about an
//! export (canvas size, file extension, page orientation) without rendering.
//!
//! ## Presets
//!
//! Both presets describe the same 21×30 cm page:
//!
//! | Preset | Portrait canvas |
//! |---|---|
//! | 180 DPI | 1488 × 2126 |
//! | 300 DPI | 2480 × 3543 |
//!
//! Landscape exports swap width and height.

use crate::geometry::Dimensions;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Print resolution preset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Resolution {
    #[default]
    #[serde(rename = "180")]
    #[value(name = "180")]
    Dpi180,
    #[serde(rename = "300")]
    #[value(name = "300")]
    Dpi300,
}

impl Resolution {
    pub fn dpi(self) -> u32 {
        match self {
            Resolution::Dpi180 => 180,
            Resolution::Dpi300 => 300,
        }
    }

    /// Portrait canvas size.
    pub fn base_size(self) -> Dimensions {
        match self {
            Resolution::Dpi180 => Dimensions::new(1488, 2126),
            Resolution::Dpi300 => Dimensions::new(2480, 3543),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape iff the sample is strictly wider than tall.
    pub fn of_sample(sample: Dimensions) -> Self {
        if sample.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Output file format chosen by the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// How each page raster is encoded. PDF pages are embedded as PNG.
    pub fn raster_encoding(self) -> RasterEncoding {
        match self {
            ExportFormat::Png | ExportFormat::Pdf => RasterEncoding::Png,
            ExportFormat::Jpg => RasterEncoding::Jpeg,
        }
    }

    /// Letterbox bars are painted white instead of left transparent.
    pub fn needs_opaque_canvas(self) -> bool {
        matches!(self, ExportFormat::Jpg | ExportFormat::Pdf)
    }
}

/// Encoding of a single rendered raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterEncoding {
    Png,
    Jpeg,
}

impl RasterEncoding {
    pub fn extension(self) -> &'static str {
        match self {
            RasterEncoding::Png => "png",
            RasterEncoding::Jpeg => "jpg",
        }
    }
}

/// Everything the rasterizer needs to know about the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSpec {
    pub resolution: Resolution,
    pub orientation: Orientation,
    pub format: ExportFormat,
    pub quality: Quality,
}

impl ExportSpec {
    /// Export preset whose orientation follows the sample image.
    pub fn for_sample(sample: Dimensions, resolution: Resolution, format: ExportFormat) -> Self {
        Self {
            resolution,
            orientation: Orientation::of_sample(sample),
            format,
            quality: Quality::default(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Canvas size after the orientation swap.
    pub fn canvas(&self) -> Dimensions {
        let base = self.resolution.base_size();
        match self.orientation {
            Orientation::Portrait => base,
            Orientation::Landscape => base.swapped(),
        }
    }
}
