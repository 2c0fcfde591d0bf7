//! Overlay geometry: pure math, no I/O.
//!
//! Three coordinate spaces share one text-box rectangle:
//!
//! | Space | Units | Used by |
//! |---|---|---|
//! | **Design** | pixels of the sample image | [`TextBox`], the source of truth |
//! | **Preview** | on-screen pixels of the rendered sample | [`interaction`](crate::interaction) |
//! | **Export** | pixels of the print canvas | [`imaging`](crate::imaging) |
//!
//! The module is split into:
//! - **Model**: value types and the invariants of a text box (bounds, floors)
//! - **Mapper**: conversions between the three spaces

mod mapper;
mod model;

pub use mapper::{
    ExportBox, FontScalePolicy, PreviewStyle, contained_rect, design_to_export,
    design_to_preview, fit_contain, preview_style, preview_to_design,
};
pub use model::{
    Align, Color, ColorParseError, Corner, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, DEFAULT_TEXT,
    DropShadow, MIN_BOX_HEIGHT, MIN_BOX_WIDTH, TextBox, TextBoxStyle, TextDirection, center_in,
    clamp_rect, clamp_to_bounds, detect_direction, move_clamped, resize_from_corner,
};

use serde::{Deserialize, Serialize};

/// Pixel size of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Strictly wider than tall. Square images count as portrait.
    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }

    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_requires_strictly_wider() {
        assert!(Dimensions::new(1200, 800).is_landscape());
        assert!(!Dimensions::new(800, 1200).is_landscape());
        assert!(!Dimensions::new(800, 800).is_landscape());
    }

    #[test]
    fn swapped_exchanges_axes() {
        assert_eq!(
            Dimensions::new(1488, 2126).swapped(),
            Dimensions::new(2126, 1488)
        );
    }

    #[test]
    fn rect_edges_and_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(!r.contains(Point::new(9.9, 20.0)));
    }
}
