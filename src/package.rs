//! Export packaging: the successful rasters of a batch become one file.
//!
//! | Format | Package | Contents |
//! |---|---|---|
//! | `png`, `jpg` | `processed_images.zip` | `processed_image_NNN.<ext>` per item |
//! | `pdf` | `processed_images.pdf` | one page per item, batch order |
//!
//! `NNN` is the item's original batch index plus one, zero padded to three
//! digits, so a failed item leaves a gap in the numbering rather than
//! shifting later files.
//!
//! PDF pages are 210 × 297 mm (297 × 210 for landscape batches) and every
//! raster is stretched to fill its page exactly.

use crate::imaging::{ExportFormat, Orientation, RasterEncoding};
use crate::process::RasterResult;
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ZIP_FILE_NAME: &str = "processed_images.zip";
pub const PDF_FILE_NAME: &str = "processed_images.pdf";

/// Portrait page size in millimetres.
const PAGE_MM: (f32, f32) = (210.0, 297.0);
/// Nominal DPI for placing page images; the transform scale stretches them
/// to the page regardless.
const PAGE_IMAGE_DPI: f32 = 300.0;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to decode page image for item {}: {reason}", .index + 1)]
    PageDecode { index: usize, reason: String },
    #[error("failed to write PDF: {0}")]
    Pdf(String),
    #[error("no processed images to package")]
    Empty,
}

/// A packaged batch, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    Zip(Vec<u8>),
    Pdf(Vec<u8>),
}

impl Package {
    pub fn file_name(&self) -> &'static str {
        match self {
            Package::Zip(_) => ZIP_FILE_NAME,
            Package::Pdf(_) => PDF_FILE_NAME,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Package::Zip(bytes) | Package::Pdf(bytes) => bytes,
        }
    }
}

/// Archive entry name for the item at batch `index`.
pub fn entry_name(index: usize, encoding: RasterEncoding) -> String {
    format!("processed_image_{:03}.{}", index + 1, encoding.extension())
}

/// Package `results` for `format`. PDF pages follow `orientation`.
pub fn package(
    results: &[RasterResult],
    format: ExportFormat,
    orientation: Orientation,
) -> Result<Package, PackageError> {
    if results.is_empty() {
        return Err(PackageError::Empty);
    }
    match format {
        ExportFormat::Pdf => pdf_pages(results, orientation).map(Package::Pdf),
        ExportFormat::Png | ExportFormat::Jpg => zip_rasters(results).map(Package::Zip),
    }
}

/// ZIP archive with one deflated entry per raster.
pub fn zip_rasters(results: &[RasterResult]) -> Result<Vec<u8>, PackageError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for result in results {
        writer.start_file(entry_name(result.index, result.raster.encoding), options)?;
        writer.write_all(&result.raster.bytes)?;
    }
    let bytes = writer.finish()?.into_inner();
    info!(entries = results.len(), size = bytes.len(), "packaged ZIP");
    Ok(bytes)
}

fn page_size_mm(orientation: Orientation) -> (f32, f32) {
    match orientation {
        Orientation::Portrait => PAGE_MM,
        Orientation::Landscape => (PAGE_MM.1, PAGE_MM.0),
    }
}

fn px_to_mm(px: u32) -> f32 {
    px as f32 / PAGE_IMAGE_DPI * 25.4
}

/// Multi-page PDF, one stretched raster per page.
pub fn pdf_pages(
    results: &[RasterResult],
    orientation: Orientation,
) -> Result<Vec<u8>, PackageError> {
    let (page_w, page_h) = page_size_mm(orientation);
    let (doc, first_page, first_layer) =
        PdfDocument::new("processed images", Mm(page_w), Mm(page_h), "Layer 1");

    for (i, result) in results.iter().enumerate() {
        let (page, layer) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(page_w), Mm(page_h), format!("Layer {}", i + 1))
        };
        let decoded = printpdf::image_crate::load_from_memory(&result.raster.bytes).map_err(
            |e| PackageError::PageDecode {
                index: result.index,
                reason: e.to_string(),
            },
        )?;
        // Pages are opaque; dropping alpha keeps the PDF free of soft masks.
        let rgb = printpdf::image_crate::DynamicImage::ImageRgb8(decoded.to_rgb8());
        let transform = ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            rotate: None,
            scale_x: Some(page_w / px_to_mm(rgb.width())),
            scale_y: Some(page_h / px_to_mm(rgb.height())),
            dpi: Some(PAGE_IMAGE_DPI),
        };
        Image::from_dynamic_image(&rgb).add_to_layer(doc.get_page(page).get_layer(layer), transform);
    }

    let mut buffer = Vec::new();
    {
        let mut writer = std::io::BufWriter::new(&mut buffer);
        doc.save(&mut writer)
            .map_err(|e| PackageError::Pdf(e.to_string()))?;
    }
    info!(pages = results.len(), size = buffer.len(), "packaged PDF");
    Ok(buffer)
}

/// Write a package. An existing directory receives the default file name;
/// any other path is used as the file path.
pub fn write_package(package: &Package, output: &Path) -> Result<PathBuf, PackageError> {
    let path = if output.is_dir() {
        output.join(package.file_name())
    } else {
        output.to_path_buf()
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, package.bytes())?;
    Ok(path)
}
