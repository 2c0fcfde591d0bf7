//! Rasterizer backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify a sample image, and compose one export raster from a
//! background buffer, a text line and a [`RenderPlan`].
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` for decode,
//! resize and encode, resvg for the text layer. Everything is statically
//! linked into the binary.

use super::operations::RenderPlan;
use super::params::RasterEncoding;
use crate::geometry::Dimensions;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to build text layer: {0}")]
    TextLayer(String),
    #[error("cannot allocate a {0} canvas")]
    CanvasAllocation(Dimensions),
    #[error("failed to encode output: {0}")]
    Encode(String),
}

impl BackendError {
    /// Failures confined to one batch item. Anything else means later items
    /// would fail the same way, so the batch stops.
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            BackendError::Io(_) | BackendError::Decode(_) | BackendError::TextLayer(_)
        )
    }
}

/// One encoded export raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub bytes: Vec<u8>,
    pub encoding: RasterEncoding,
    pub dimensions: Dimensions,
}

/// Trait for rasterizer backends.
///
/// Backends hold no per-render state: every call gets a fresh canvas, so a
/// failed compose never leaks into the next one.
pub trait ImageBackend {
    /// Pixel size of an encoded image, without a full decode where possible.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Draw `background` letterboxed onto the export canvas, stamp `text`
    /// using the plan's text box, and encode.
    fn compose(
        &self,
        plan: &RenderPlan,
        background: &[u8],
        text: &str,
    ) -> Result<Raster, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Background bytes the mock refuses to decode.
    pub const CORRUPT: &[u8] = b"corrupt";

    /// Mock backend that records compose calls without rendering.
    ///
    /// Backgrounds equal to [`CORRUPT`] fail with a decode error; the call
    /// at `fatal_at` (0-based, counting every compose) fails with an encode
    /// error. Successful rasters carry the text as their bytes.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_result: Option<Dimensions>,
        pub fatal_at: Option<usize>,
        pub calls: RefCell<Vec<RecordedCompose>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCompose {
        pub text: String,
        pub background_len: usize,
        pub canvas: Dimensions,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Dimensions) -> Self {
            Self {
                identify_result: Some(dims),
                ..Self::default()
            }
        }

        pub fn failing_at(index: usize) -> Self {
            Self {
                fatal_at: Some(index),
                ..Self::default()
            }
        }

        pub fn texts(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.text.clone()).collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, _bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.identify_result
                .ok_or_else(|| BackendError::Decode("no mock dimensions".to_string()))
        }

        fn compose(
            &self,
            plan: &RenderPlan,
            background: &[u8],
            text: &str,
        ) -> Result<Raster, BackendError> {
            let call_index = self.calls.borrow().len();
            self.calls.borrow_mut().push(RecordedCompose {
                text: text.to_string(),
                background_len: background.len(),
                canvas: plan.canvas(),
            });

            if background == CORRUPT {
                return Err(BackendError::Decode("mock corrupt image".to_string()));
            }
            if self.fatal_at == Some(call_index) {
                return Err(BackendError::Encode("mock encoder failure".to_string()));
            }
            Ok(Raster {
                bytes: text.as_bytes().to_vec(),
                encoding: plan.export.format.raster_encoding(),
                dimensions: plan.canvas(),
            })
        }
    }

    #[test]
    fn error_scopes() {
        assert!(BackendError::Decode("x".into()).is_item_scoped());
        assert!(BackendError::Io(std::io::Error::other("x")).is_item_scoped());
        assert!(!BackendError::Encode("x".into()).is_item_scoped());
        assert!(!BackendError::CanvasAllocation(Dimensions::new(0, 0)).is_item_scoped());
    }

    #[test]
    fn mock_records_compose() {
        let backend = MockBackend::new();
        let plan = RenderPlan::for_tests();

        let raster = backend.compose(&plan, b"png", "hello").unwrap();
        assert_eq!(raster.bytes, b"hello");
        assert_eq!(raster.dimensions, Dimensions::new(1488, 2126));

        let calls = backend.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].background_len, 3);
    }

    #[test]
    fn mock_fails_on_corrupt_and_fatal_index() {
        let backend = MockBackend::failing_at(1);
        let plan = RenderPlan::for_tests();

        let err = backend.compose(&plan, CORRUPT, "a").unwrap_err();
        assert!(err.is_item_scoped());
        let err = backend.compose(&plan, b"ok", "b").unwrap_err();
        assert!(!err.is_item_scoped());
        assert_eq!(backend.texts(), vec!["a", "b"]);
    }
}
