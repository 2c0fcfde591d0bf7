//! Rasterization: one background + one text line → one export raster.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Fit + letterbox** | [`fit_contain`](crate::geometry::fit_contain), Lanczos3 resize |
//! | **Text layer** | SVG → `usvg`/`resvg` (shaping, bidi, stroke, shadow) |
//! | **Encode** | PNG, or JPEG on an opaque canvas |
//!
//! The module is split into:
//! - **Parameters**: export presets, formats and quality
//! - **Fonts**: the [`FontCatalog`] injected into the backend
//! - **Text**: the SVG text layer
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`RenderPlan`] and building it from a sample image

pub mod backend;
pub mod fonts;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod text;

pub use backend::{BackendError, ImageBackend, Raster};
pub use fonts::{FontCatalog, FontError};
pub use operations::{RenderPlan, plan_for_sample};
pub use params::{
    ExportFormat, ExportSpec, Orientation, Quality, RasterEncoding, Resolution,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
