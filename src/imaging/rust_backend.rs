//! Pure Rust rasterizer backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Contain fit | [`fit_contain`](crate::geometry::fit_contain) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Letterbox + layering | `image::imageops::overlay` |
//! | Text (shaping, bidi, stroke, shadow) | `usvg` + `resvg` onto a `tiny-skia` pixmap |
//! | Encode → PNG | `image::ImageFormat::Png` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, opaque RGB |

use super::backend::{BackendError, ImageBackend, Raster};
use super::fonts::{FALLBACK_FAMILY, FontCatalog};
use super::operations::RenderPlan;
use super::params::{Quality, RasterEncoding};
use super::text::{self, TextLayer};
use crate::geometry::{Dimensions, detect_direction, fit_contain};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Rgba, RgbaImage,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Canvases above this many pixels are refused rather than allocated.
const MAX_CANVAS_PIXELS: u64 = 200_000_000;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate and resvg.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustBackend {
    fonts: FontCatalog,
    /// Families already reported missing, so a batch warns once per family.
    warned_fonts: RefCell<HashSet<String>>,
}

impl RustBackend {
    pub fn new(fonts: FontCatalog) -> Self {
        Self {
            fonts,
            warned_fonts: RefCell::new(HashSet::new()),
        }
    }

    pub fn fonts(&self) -> &FontCatalog {
        &self.fonts
    }

    fn font_family(&self, requested: &str) -> String {
        if !self.fonts.is_available(requested)
            && self.warned_fonts.borrow_mut().insert(requested.to_string())
        {
            warn!(
                font = requested,
                "font family unavailable, falling back to {FALLBACK_FAMILY}"
            );
        }
        self.fonts.family_list(requested)
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new(FontCatalog::with_system_fonts())
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Fresh canvas: white when the output has no alpha, transparent otherwise.
fn blank_canvas(size: Dimensions, opaque: bool) -> Result<RgbaImage, BackendError> {
    let pixels = size.width as u64 * size.height as u64;
    if pixels == 0 || pixels > MAX_CANVAS_PIXELS {
        return Err(BackendError::CanvasAllocation(size));
    }
    let fill = if opaque {
        Rgba([255, 255, 255, 255])
    } else {
        Rgba([0, 0, 0, 0])
    };
    Ok(RgbaImage::from_pixel(size.width, size.height, fill))
}

fn encode(
    canvas: RgbaImage,
    encoding: RasterEncoding,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let (width, height) = canvas.dimensions();
    let mut bytes = Vec::new();
    match encoding {
        RasterEncoding::Png => DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?,
        RasterEncoding::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality.value() as u8)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?
        }
    }
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions::new(width, height))
    }

    fn compose(
        &self,
        plan: &RenderPlan,
        background: &[u8],
        text: &str,
    ) -> Result<Raster, BackendError> {
        let img = decode(background)?;
        let source = Dimensions::new(img.width(), img.height());
        let canvas_size = plan.canvas();
        let letterbox = fit_contain(source, canvas_size);
        let mut canvas = blank_canvas(canvas_size, plan.export.format.needs_opaque_canvas())?;

        let fitted_w = (letterbox.width.round() as u32).max(1);
        let fitted_h = (letterbox.height.round() as u32).max(1);
        let fitted = img.resize_exact(fitted_w, fitted_h, FilterType::Lanczos3);
        imageops::overlay(
            &mut canvas,
            &fitted.to_rgba8(),
            letterbox.x.round() as i64,
            letterbox.y.round() as i64,
        );
        debug!(%source, canvas = %canvas_size, fitted_w, fitted_h, "background placed");

        if !text.trim().is_empty() {
            let style = &plan.text_box.style;
            let layer = TextLayer {
                canvas: canvas_size,
                text,
                style,
                placement: plan.placement(letterbox),
                direction: detect_direction(text),
                font_family: self.font_family(&style.font_family),
                shadow: plan.shadow,
            };
            let svg = text::build_svg(&layer);
            let rendered = text::rasterize(&svg, canvas_size, &self.fonts)?;
            imageops::overlay(&mut canvas, &rendered, 0, 0);
        }

        let encoding = plan.export.format.raster_encoding();
        let bytes = encode(canvas, encoding, plan.export.quality)?;
        Ok(Raster {
            bytes,
            encoding,
            dimensions: canvas_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TextBox;
    use crate::imaging::params::{ExportFormat, ExportSpec, Resolution};
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    fn plan(design: Dimensions, format: ExportFormat) -> RenderPlan {
        RenderPlan::new(
            design,
            &TextBox::centered_in(design),
            ExportSpec::for_sample(design, Resolution::Dpi180, format),
        )
    }

    fn backend() -> RustBackend {
        RustBackend::new(FontCatalog::empty())
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let dims = backend().identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(dims, Dimensions::new(200, 150));
    }

    #[test]
    fn identify_garbage_errors() {
        assert!(backend().identify(b"definitely not an image").is_err());
    }

    #[test]
    fn png_export_has_transparent_bars() {
        let design = Dimensions::new(80, 40);
        let raster = backend()
            .compose(&plan(design, ExportFormat::Png), &png_bytes(80, 40), "")
            .unwrap();
        assert_eq!(raster.encoding, RasterEncoding::Png);
        assert_eq!(raster.dimensions, Dimensions::new(2126, 1488));

        // 2:1 into 2126x1488 is width-filled: bars top and bottom.
        let out = image::load_from_memory(&raster.bytes).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (2126, 1488));
        assert_eq!(out.get_pixel(1063, 5)[3], 0);
        assert_eq!(out.get_pixel(1063, 744)[3], 255);
    }

    #[test]
    fn jpg_export_has_white_bars() {
        let design = Dimensions::new(40, 80);
        let raster = backend()
            .compose(&plan(design, ExportFormat::Jpg), &png_bytes(40, 80), "")
            .unwrap();
        assert_eq!(raster.encoding, RasterEncoding::Jpeg);

        let out = image::load_from_memory(&raster.bytes).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (1488, 2126));
        // 1:2 into 1488x2126 is height-filled: bars left and right.
        let bar = out.get_pixel(5, 1063);
        assert!(bar.0.iter().all(|&c| c > 240), "bar not white: {bar:?}");
    }

    #[test]
    fn corrupt_background_is_item_scoped() {
        let design = Dimensions::new(40, 80);
        let err = backend()
            .compose(&plan(design, ExportFormat::Png), b"corrupt", "hi")
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        assert!(err.is_item_scoped());
    }

    #[test]
    fn oversized_canvas_is_refused() {
        let err = blank_canvas(Dimensions::new(100_000, 100_000), false).unwrap_err();
        assert!(matches!(err, BackendError::CanvasAllocation(_)));
        assert!(!err.is_item_scoped());
    }

    #[test]
    fn text_with_missing_font_still_renders() {
        let design = Dimensions::new(40, 80);
        let backend = backend();
        let raster = backend
            .compose(&plan(design, ExportFormat::Png), &png_bytes(40, 80), "שלום Hello")
            .unwrap();
        assert!(!raster.bytes.is_empty());
        assert!(backend.warned_fonts.borrow().contains("David"));
    }
}
