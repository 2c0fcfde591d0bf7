//! High-level image operations.
//!
//! A [`RenderPlan`] is the immutable snapshot every rasterization in a batch
//! reads: the designed text box, the sample's size (design space) and the
//! export parameters. Building it from a sample image is the only operation
//! that touches the backend here.

use super::backend::{BackendError, ImageBackend};
use super::params::{ExportFormat, ExportSpec, Quality, Resolution};
use crate::geometry::{
    Dimensions, DropShadow, ExportBox, FontScalePolicy, Rect, TextBox, clamp_to_bounds,
    design_to_export,
};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Sample image size; the text box lives in this space.
    pub design: Dimensions,
    pub text_box: TextBox,
    pub export: ExportSpec,
    pub font_scale: FontScalePolicy,
    /// Shadow for unstroked text, design units.
    pub shadow: DropShadow,
}

impl RenderPlan {
    /// The text box is clamped into `design`.
    pub fn new(design: Dimensions, text_box: &TextBox, export: ExportSpec) -> Self {
        Self {
            design,
            text_box: clamp_to_bounds(text_box, design),
            export,
            font_scale: FontScalePolicy::default(),
            shadow: DropShadow::default(),
        }
    }

    pub fn with_font_scale(mut self, policy: FontScalePolicy) -> Self {
        self.font_scale = policy;
        self
    }

    pub fn with_shadow(mut self, shadow: DropShadow) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.export.quality = quality;
        self
    }

    /// Export canvas size, orientation applied.
    pub fn canvas(&self) -> Dimensions {
        self.export.canvas()
    }

    /// The text box mapped onto a background fitted at `letterbox`.
    pub fn placement(&self, letterbox: Rect) -> ExportBox {
        design_to_export(
            self.text_box.rect(),
            self.design,
            letterbox,
            self.font_scale,
        )
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let design = Dimensions::new(800, 1200);
        Self::new(
            design,
            &TextBox::centered_in(design),
            ExportSpec::for_sample(design, Resolution::Dpi180, ExportFormat::Png),
        )
    }
}

/// Identify the sample image and build a plan whose orientation follows it.
pub fn plan_for_sample(
    backend: &impl ImageBackend,
    sample: &[u8],
    text_box: &TextBox,
    resolution: Resolution,
    format: ExportFormat,
) -> Result<RenderPlan> {
    let design = backend.identify(sample)?;
    let export = ExportSpec::for_sample(design, resolution, format);
    Ok(RenderPlan::new(design, text_box, export))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::params::Orientation;

    #[test]
    fn plan_follows_landscape_sample() {
        let backend = MockBackend::with_dimensions(Dimensions::new(1200, 800));
        let text_box = TextBox::centered_in(Dimensions::new(1200, 800));
        let plan = plan_for_sample(
            &backend,
            b"sample",
            &text_box,
            Resolution::Dpi180,
            ExportFormat::Jpg,
        )
        .unwrap();

        assert_eq!(plan.design, Dimensions::new(1200, 800));
        assert_eq!(plan.export.orientation, Orientation::Landscape);
        assert_eq!(plan.canvas(), Dimensions::new(2126, 1488));
    }

    #[test]
    fn plan_clamps_box_into_sample() {
        let mut text_box = TextBox::centered_in(Dimensions::new(2000, 2000));
        text_box.x = 1500.0;
        text_box.y = 1500.0;
        let design = Dimensions::new(800, 600);
        let plan = RenderPlan::new(
            design,
            &text_box,
            ExportSpec::for_sample(design, Resolution::Dpi300, ExportFormat::Png),
        );
        assert_eq!(plan.text_box.x + plan.text_box.width, 800.0);
        assert_eq!(plan.text_box.y + plan.text_box.height, 600.0);
    }

    #[test]
    fn full_box_maps_to_letterbox() {
        let design = Dimensions::new(1000, 500);
        let mut text_box = TextBox::centered_in(design);
        text_box.set_rect(Rect::new(0.0, 0.0, 1000.0, 500.0));
        let plan = RenderPlan::new(
            design,
            &text_box,
            ExportSpec::for_sample(design, Resolution::Dpi180, ExportFormat::Png),
        );
        let letterbox = Rect::new(0.0, 250.0, 2000.0, 1000.0);
        assert_eq!(plan.placement(letterbox).rect, letterbox);
    }

    #[test]
    fn unidentifiable_sample_is_an_error() {
        let backend = MockBackend::new();
        let result = plan_for_sample(
            &backend,
            b"?",
            &TextBox::centered_in(Dimensions::new(10, 10)),
            Resolution::Dpi180,
            ExportFormat::Png,
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
