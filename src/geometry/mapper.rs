//! Conversions between design, preview and export space.
//!
//! Preview mapping is a plain per-axis scale onto the rendered image's
//! on-screen box and may be non-uniform. Export mapping first fits the
//! target image into the print canvas with a uniform "contain" fit, then
//! scales the box per axis onto the fitted region.

use super::model::{Align, DropShadow, TextBoxStyle, TextDirection, detect_direction};
use super::{Dimensions, Point, Rect};
use serde::{Deserialize, Serialize};

/// Which export scale factor drives font size and stroke width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontScalePolicy {
    /// Horizontal scale only. Layouts are designed against the sample's width.
    #[default]
    Horizontal,
    /// `min(scale_x, scale_y)`.
    Uniform,
}

impl FontScalePolicy {
    pub fn size_scale(self, scale_x: f64, scale_y: f64) -> f64 {
        match self {
            FontScalePolicy::Horizontal => scale_x,
            FontScalePolicy::Uniform => scale_x.min(scale_y),
        }
    }
}

/// Region an image of `image` size occupies when fitted ("contain") into
/// `canvas`, centered along the letterboxed axis.
///
/// Wider images fill the width and get bars top and bottom; taller images
/// fill the height and get bars left and right. Equal aspect ratios take the
/// width-filled branch.
pub fn fit_contain(image: Dimensions, canvas: Dimensions) -> Rect {
    fit_into(image.aspect(), canvas.width as f64, canvas.height as f64)
}

fn fit_into(image_aspect: f64, canvas_w: f64, canvas_h: f64) -> Rect {
    let canvas_aspect = canvas_w / canvas_h;
    if image_aspect >= canvas_aspect {
        let h = canvas_w / image_aspect;
        Rect::new(0.0, (canvas_h - h) / 2.0, canvas_w, h)
    } else {
        let w = canvas_h * image_aspect;
        Rect::new((canvas_w - w) / 2.0, 0.0, w, canvas_h)
    }
}

/// On-screen box of an image shown with `object-fit: contain` inside
/// `container`. The overlay must track this box, not the container.
pub fn contained_rect(container: Rect, image: Dimensions) -> Rect {
    let fitted = fit_into(image.aspect(), container.width, container.height);
    Rect::new(
        container.x + fitted.x,
        container.y + fitted.y,
        fitted.width,
        fitted.height,
    )
}

fn preview_scale(design: Dimensions, preview: &Rect) -> (f64, f64) {
    (
        preview.width / design.width as f64,
        preview.height / design.height as f64,
    )
}

/// Map a design-space rectangle onto the preview's on-screen image box.
pub fn design_to_preview(rect: Rect, design: Dimensions, preview: Rect) -> Rect {
    let (sx, sy) = preview_scale(design, &preview);
    Rect::new(
        preview.x + rect.x * sx,
        preview.y + rect.y * sy,
        rect.width * sx,
        rect.height * sy,
    )
}

/// Map an on-screen point back to design space. Inverse of
/// [`design_to_preview`]. A collapsed preview maps everything to the origin.
pub fn preview_to_design(point: Point, design: Dimensions, preview: Rect) -> Point {
    let (sx, sy) = preview_scale(design, &preview);
    let inv = |v: f64, s: f64| if s > 0.0 { v / s } else { 0.0 };
    Point::new(inv(point.x - preview.x, sx), inv(point.y - preview.y, sy))
}

/// A text box mapped onto the export canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportBox {
    pub rect: Rect,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Factor applied to font size, stroke and shadow.
    pub size_scale: f64,
}

impl ExportBox {
    pub fn font_size(&self, style: &TextBoxStyle) -> f64 {
        style.font_size * self.size_scale
    }

    /// Outline width for a centered stroke: doubled so the visible outside
    /// half matches the designed width.
    pub fn outline_width(&self, style: &TextBoxStyle) -> f64 {
        style.stroke_width * self.size_scale * 2.0
    }

    /// Text anchor: horizontal per alignment, vertical at the box midline.
    pub fn anchor(&self, align: Align) -> Point {
        let x = match align {
            Align::Left => self.rect.x,
            Align::Center => self.rect.x + self.rect.width / 2.0,
            Align::Right => self.rect.right(),
        };
        Point::new(x, self.rect.y + self.rect.height / 2.0)
    }
}

/// Map a design-space rectangle into an export canvas whose background
/// occupies `letterbox` (see [`fit_contain`]).
pub fn design_to_export(
    rect: Rect,
    design: Dimensions,
    letterbox: Rect,
    policy: FontScalePolicy,
) -> ExportBox {
    let scale_x = letterbox.width / design.width as f64;
    let scale_y = letterbox.height / design.height as f64;
    ExportBox {
        rect: Rect::new(
            letterbox.x + rect.x * scale_x,
            letterbox.y + rect.y * scale_y,
            rect.width * scale_x,
            rect.height * scale_y,
        ),
        scale_x,
        scale_y,
        size_scale: policy.size_scale(scale_x, scale_y),
    }
}

/// Style values for drawing the live preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewStyle {
    pub font_size: f64,
    pub stroke_width: f64,
    /// Fixed CSS shadow, only when there is no stroke.
    pub shadow: Option<DropShadow>,
    pub direction: TextDirection,
}

/// Scale a style for the preview: sizes follow the horizontal preview scale.
pub fn preview_style(
    style: &TextBoxStyle,
    text: &str,
    design: Dimensions,
    preview: Rect,
) -> PreviewStyle {
    let (sx, _) = preview_scale(design, &preview);
    PreviewStyle {
        font_size: style.font_size * sx,
        stroke_width: style.stroke_width * sx,
        shadow: (style.stroke_width <= 0.0).then(DropShadow::default),
        direction: detect_direction(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS * a.abs().max(b.abs()).max(1.0)
    }

    // =========================================================================
    // fit_contain
    // =========================================================================

    #[test]
    fn wide_image_fills_width_with_bars_top_and_bottom() {
        // 1200x800 (3:2) into portrait 1488x2126
        let r = fit_contain(Dimensions::new(1200, 800), Dimensions::new(1488, 2126));
        assert_eq!(r.x, 0.0);
        assert_eq!(r.width, 1488.0);
        assert!(close(r.height, 992.0));
        assert!(close(r.y, (2126.0 - 992.0) / 2.0));
    }

    #[test]
    fn tall_image_fills_height_with_bars_left_and_right() {
        // 600x1800 (1:3) into 1488x2126
        let r = fit_contain(Dimensions::new(600, 1800), Dimensions::new(1488, 2126));
        assert_eq!(r.y, 0.0);
        assert_eq!(r.height, 2126.0);
        assert!(close(r.width, 2126.0 / 3.0));
        assert!(close(r.x, (1488.0 - 2126.0 / 3.0) / 2.0));
    }

    #[test]
    fn equal_aspect_fills_whole_canvas() {
        let r = fit_contain(Dimensions::new(1000, 2000), Dimensions::new(500, 1000));
        assert_eq!(r, Rect::new(0.0, 0.0, 500.0, 1000.0));
    }

    #[test]
    fn contained_rect_offsets_by_container_origin() {
        // 2:1 image in a 300x400 container at (10, 20)
        let r = contained_rect(
            Rect::new(10.0, 20.0, 300.0, 400.0),
            Dimensions::new(800, 400),
        );
        assert_eq!(r, Rect::new(10.0, 145.0, 300.0, 150.0));
    }

    // =========================================================================
    // preview mapping
    // =========================================================================

    #[test]
    fn preview_round_trip_is_identity() {
        let design = Dimensions::new(1200, 800);
        // Deliberately non-uniform preview scale
        let preview = Rect::new(37.5, 12.25, 333.0, 451.0);
        for i in 0..=12 {
            for j in 0..=8 {
                let p = Point::new(i as f64 * 100.0, j as f64 * 100.0);
                let r = design_to_preview(Rect::new(p.x, p.y, 0.0, 0.0), design, preview);
                let back = preview_to_design(r.origin(), design, preview);
                assert!(close(back.x, p.x) && close(back.y, p.y), "{p:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn design_to_preview_scales_per_axis() {
        let r = design_to_preview(
            Rect::new(100.0, 100.0, 300.0, 100.0),
            Dimensions::new(1000, 500),
            Rect::new(0.0, 0.0, 500.0, 500.0),
        );
        assert_eq!(r, Rect::new(50.0, 100.0, 150.0, 100.0));
    }

    #[test]
    fn collapsed_preview_maps_to_origin() {
        let p = preview_to_design(
            Point::new(10.0, 10.0),
            Dimensions::new(100, 100),
            Rect::new(0.0, 0.0, 0.0, 0.0),
        );
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn preview_style_scales_with_width_and_adds_shadow_without_stroke() {
        let mut style = TextBoxStyle::default();
        let design = Dimensions::new(1000, 800);
        let preview = Rect::new(0.0, 0.0, 500.0, 300.0);
        let s = preview_style(&style, "abc", design, preview);
        assert_eq!(s.font_size, 18.0);
        assert_eq!(s.stroke_width, 1.0);
        assert!(s.shadow.is_none());

        style.stroke_width = 0.0;
        let s = preview_style(&style, "שלום", design, preview);
        assert_eq!(s.shadow, Some(DropShadow::default()));
        assert_eq!(s.direction, TextDirection::Rtl);
    }

    // =========================================================================
    // export mapping
    // =========================================================================

    #[test]
    fn full_design_box_maps_to_letterbox_not_canvas() {
        let design = Dimensions::new(1200, 800);
        let canvas = Dimensions::new(1488, 2126);
        let letterbox = fit_contain(design, canvas);
        let full = Rect::new(0.0, 0.0, 1200.0, 800.0);
        let mapped = design_to_export(full, design, letterbox, FontScalePolicy::Horizontal);
        assert!(close(mapped.rect.x, letterbox.x));
        assert!(close(mapped.rect.y, letterbox.y));
        assert!(close(mapped.rect.width, letterbox.width));
        assert!(close(mapped.rect.height, letterbox.height));
        assert!(mapped.rect.height < canvas.height as f64);
    }

    #[test]
    fn target_with_other_aspect_scales_axes_independently() {
        // Designed on 1000x1000, stamped on a 2:1 target in a 2000x2000 canvas
        let design = Dimensions::new(1000, 1000);
        let letterbox = fit_contain(Dimensions::new(2000, 1000), Dimensions::new(2000, 2000));
        let b = design_to_export(
            Rect::new(100.0, 100.0, 200.0, 100.0),
            design,
            letterbox,
            FontScalePolicy::Horizontal,
        );
        assert_eq!((b.scale_x, b.scale_y), (2.0, 1.0));
        assert_eq!(b.rect, Rect::new(200.0, 500.0 + 100.0, 400.0, 100.0));
        assert_eq!(b.size_scale, 2.0);
    }

    #[test]
    fn uniform_policy_uses_smaller_scale() {
        let design = Dimensions::new(1000, 1000);
        let letterbox = Rect::new(0.0, 500.0, 2000.0, 1000.0);
        let b = design_to_export(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            design,
            letterbox,
            FontScalePolicy::Uniform,
        );
        assert_eq!(b.size_scale, 1.0);
        let style = TextBoxStyle::default();
        assert_eq!(b.font_size(&style), 36.0);
        assert_eq!(b.outline_width(&style), 4.0);
    }

    #[test]
    fn anchor_follows_alignment_and_box_midline() {
        let b = ExportBox {
            rect: Rect::new(100.0, 200.0, 400.0, 50.0),
            scale_x: 1.0,
            scale_y: 1.0,
            size_scale: 1.0,
        };
        assert_eq!(b.anchor(Align::Left), Point::new(100.0, 225.0));
        assert_eq!(b.anchor(Align::Center), Point::new(300.0, 225.0));
        assert_eq!(b.anchor(Align::Right), Point::new(500.0, 225.0));
    }
}
