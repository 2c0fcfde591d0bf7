//! The text layer: an SVG document rasterized with resvg.
//!
//! The layer is the size of the whole export canvas and transparent except
//! for the text, so it can be laid over the background at (0, 0). usvg
//! handles shaping and bidi; the layout direction comes from
//! [`detect_direction`](crate::geometry::detect_direction).
//!
//! With a stroke, two `<text>` elements share one position: the outline pass
//! (fill none, round joins) under the fill pass. Without a stroke, the fill
//! pass carries a drop-shadow filter instead.

use super::backend::BackendError;
use super::fonts::FontCatalog;
use crate::geometry::{Align, Dimensions, DropShadow, ExportBox, TextBoxStyle, TextDirection};
use image::{Rgba, RgbaImage};
use resvg::render;
use std::fmt::Write as _;
use tiny_skia::Pixmap;
use usvg::{Options, Tree};

/// Everything needed to draw one line of overlay text on an export canvas.
#[derive(Debug, Clone)]
pub struct TextLayer<'a> {
    pub canvas: Dimensions,
    pub text: &'a str,
    pub style: &'a TextBoxStyle,
    pub placement: ExportBox,
    pub direction: TextDirection,
    /// Resolved `font-family` value.
    pub font_family: String,
    /// Shadow in design units; scaled with the text.
    pub shadow: DropShadow,
}

/// SVG `text-anchor` for an alignment. usvg places `start` at the left edge
/// of the run and `end` at its right edge whatever the direction, so the
/// direction only drives shaping.
pub fn text_anchor(align: Align) -> &'static str {
    match align {
        Align::Left => "start",
        Align::Center => "middle",
        Align::Right => "end",
    }
}

pub fn build_svg(layer: &TextLayer<'_>) -> String {
    let TextLayer {
        canvas,
        text,
        style,
        placement,
        direction,
        ..
    } = layer;
    let anchor = placement.anchor(style.align);
    let stroked = style.stroke_width > 0.0;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = canvas.width,
        h = canvas.height
    );

    if !stroked {
        let shadow = layer.shadow.scaled(placement.size_scale);
        let _ = write!(
            svg,
            r##"<defs><filter id="shadow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{dx}" dy="{dy}" stdDeviation="{sd}" flood-color="#000000" flood-opacity="{op}"/></filter></defs>"##,
            dx = shadow.dx,
            dy = shadow.dy,
            sd = shadow.blur / 2.0,
            op = shadow.opacity,
        );
    }

    let common = format!(
        r#"x="{x}" y="{y}" font-size="{size}" font-family="{family}" text-anchor="{anchor}" direction="{dir}" dominant-baseline="middle" xml:space="preserve""#,
        x = anchor.x,
        y = anchor.y,
        size = placement.font_size(style),
        family = escape_xml(&layer.font_family),
        anchor = text_anchor(style.align),
        dir = direction.as_str(),
    );
    let content = escape_xml(text);

    if stroked {
        let _ = write!(
            svg,
            r#"<text {common} fill="none" stroke="{color}" stroke-opacity="{op}" stroke-width="{width}" stroke-linejoin="round" stroke-linecap="round" stroke-miterlimit="2">{content}</text>"#,
            color = style.stroke_color.hex_rgb(),
            op = style.stroke_color.opacity(),
            width = placement.outline_width(style),
        );
        let _ = write!(
            svg,
            r#"<text {common} fill="{color}" fill-opacity="{op}">{content}</text>"#,
            color = style.color.hex_rgb(),
            op = style.color.opacity(),
        );
    } else {
        let _ = write!(
            svg,
            r#"<text {common} fill="{color}" fill-opacity="{op}" filter="url(#shadow)">{content}</text>"#,
            color = style.color.hex_rgb(),
            op = style.color.opacity(),
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Rasterize a text-layer SVG into a straight-alpha RGBA image of
/// `canvas` size.
pub fn rasterize(
    svg: &str,
    canvas: Dimensions,
    fonts: &FontCatalog,
) -> Result<RgbaImage, BackendError> {
    let options = Options {
        fontdb: fonts.database(),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).map_err(|e| BackendError::TextLayer(e.to_string()))?;
    let mut pixmap =
        Pixmap::new(canvas.width, canvas.height).ok_or(BackendError::CanvasAllocation(canvas))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);

    // tiny-skia stores premultiplied alpha; image overlays expect straight.
    let mut layer = RgbaImage::new(canvas.width, canvas.height);
    for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(layer)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
