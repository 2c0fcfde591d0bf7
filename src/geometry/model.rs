//! The text box and its invariants, in design-space pixels.
//!
//! Invariants every function here preserves:
//! - `0 <= x` and `x + width <= design width` (same for `y`/`height`)
//! - `width >= 50`, `height >= 30`, unless the image itself is smaller, in
//!   which case the floor is the image size
//!
//! All functions are pure over value types.

use super::{Dimensions, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest usable box width in design pixels.
pub const MIN_BOX_WIDTH: f64 = 50.0;
/// Smallest usable box height in design pixels.
pub const MIN_BOX_HEIGHT: f64 = 30.0;

pub const DEFAULT_BOX_WIDTH: f64 = 300.0;
pub const DEFAULT_BOX_HEIGHT: f64 = 100.0;
pub const DEFAULT_TEXT: &str = "שלום עולם Hello World";

/// Unicode Hebrew block.
const HEBREW_BLOCK: std::ops::RangeInclusive<char> = '\u{0590}'..='\u{05FF}';

// ============================================================================
// Style
// ============================================================================

/// Horizontal alignment of the text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|n| n * 17)
                        .map_err(|_| err())
                };
                Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.hex_rgb())
        } else {
            write!(f, "{}{:02x}", self.hex_rgb(), self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Shadow drawn behind unstroked text for legibility over photographs.
///
/// Offsets and blur are in the units of the space the shadow is drawn in;
/// use [`DropShadow::scaled`] to move between spaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropShadow {
    pub dx: f64,
    pub dy: f64,
    /// Blur radius (CSS convention: twice the Gaussian standard deviation).
    pub blur: f64,
    pub opacity: f64,
}

impl DropShadow {
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            dx: self.dx * factor,
            dy: self.dy * factor,
            blur: self.blur * factor,
            opacity: self.opacity,
        }
    }
}

impl Default for DropShadow {
    fn default() -> Self {
        Self {
            dx: 2.0,
            dy: 2.0,
            blur: 4.0,
            opacity: 0.3,
        }
    }
}

/// Immutable style snapshot applied to every render.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxStyle {
    pub font_size: f64,
    pub color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub align: Align,
    pub font_family: String,
}

impl Default for TextBoxStyle {
    fn default() -> Self {
        Self {
            font_size: 36.0,
            color: Color::BLACK,
            stroke_color: Color::WHITE,
            stroke_width: 2.0,
            align: Align::Center,
            font_family: "David".to_string(),
        }
    }
}

// ============================================================================
// Text direction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// Any character from the Hebrew block makes the whole string right-to-left.
pub fn detect_direction(text: &str) -> TextDirection {
    if text.chars().any(|c| HEBREW_BLOCK.contains(&c)) {
        TextDirection::Rtl
    } else {
        TextDirection::Ltr
    }
}

// ============================================================================
// Text box
// ============================================================================

/// Corner handle of the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    fn moves_left_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Sw)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Ne)
    }

    /// Position of this corner on `rect`.
    pub fn of(self, rect: &Rect) -> Point {
        let x = if self.moves_left_edge() {
            rect.x
        } else {
            rect.right()
        };
        let y = if self.moves_top_edge() {
            rect.y
        } else {
            rect.bottom()
        };
        Point::new(x, y)
    }
}

/// The overlay text box. Positional fields are design-space pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub style: TextBoxStyle,
}

impl TextBox {
    /// Default box for a freshly loaded sample image: 300×100, centered.
    pub fn centered_in(bounds: Dimensions) -> Self {
        let size = clamp_rect(
            Rect::new(0.0, 0.0, DEFAULT_BOX_WIDTH, DEFAULT_BOX_HEIGHT),
            bounds,
        );
        let origin = center_in(bounds, (size.width, size.height));
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            text: DEFAULT_TEXT.to_string(),
            style: TextBoxStyle::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    pub fn direction(&self) -> TextDirection {
        detect_direction(&self.text)
    }
}

/// Enforce the position and size invariants on a box.
pub fn clamp_to_bounds(text_box: &TextBox, bounds: Dimensions) -> TextBox {
    let mut clamped = text_box.clone();
    clamped.set_rect(clamp_rect(text_box.rect(), bounds));
    clamped
}

/// Rectangle form of [`clamp_to_bounds`]. Size is clamped first, then position.
pub fn clamp_rect(rect: Rect, bounds: Dimensions) -> Rect {
    let bound_w = bounds.width as f64;
    let bound_h = bounds.height as f64;
    let width = clamp_length(rect.width, MIN_BOX_WIDTH, bound_w);
    let height = clamp_length(rect.height, MIN_BOX_HEIGHT, bound_h);
    Rect::new(
        clamp_position(rect.x, bound_w - width),
        clamp_position(rect.y, bound_h - height),
        width,
        height,
    )
}

fn clamp_length(len: f64, floor: f64, limit: f64) -> f64 {
    let floor = floor.min(limit);
    if len.is_nan() {
        floor
    } else {
        len.clamp(floor, limit)
    }
}

fn clamp_position(pos: f64, max: f64) -> f64 {
    if pos.is_nan() {
        0.0
    } else {
        pos.clamp(0.0, max.max(0.0))
    }
}

/// Top-left position that centers a box of `size` in `bounds`, never negative.
pub fn center_in(bounds: Dimensions, size: (f64, f64)) -> Point {
    let (w, h) = size;
    Point::new(
        ((bounds.width as f64 - w) / 2.0).max(0.0),
        ((bounds.height as f64 - h) / 2.0).max(0.0),
    )
}

/// Move a box so its top-left lands on `top_left`, kept inside `bounds`.
pub fn move_clamped(rect: Rect, top_left: Point, bounds: Dimensions) -> Rect {
    Rect::new(
        clamp_position(top_left.x, bounds.width as f64 - rect.width),
        clamp_position(top_left.y, bounds.height as f64 - rect.height),
        rect.width,
        rect.height,
    )
}

/// Apply an incremental pointer delta to one corner of a box.
///
/// The edges meeting at `corner` move; the opposite edges stay anchored.
/// Size floors apply before the position shift, so once a floor is hit the
/// anchored edge does not move. Moving edges stop at the image bounds.
pub fn resize_from_corner(rect: Rect, corner: Corner, delta: Point, bounds: Dimensions) -> Rect {
    let bound_w = bounds.width as f64;
    let bound_h = bounds.height as f64;
    let min_w = MIN_BOX_WIDTH.min(bound_w);
    let min_h = MIN_BOX_HEIGHT.min(bound_h);

    let (x, width) = if corner.moves_left_edge() {
        let right = rect.right();
        let x = clamp_position(rect.x + delta.x, right - min_w);
        (x, right - x)
    } else {
        let limit = (bound_w - rect.x).max(min_w);
        (rect.x, clamp_length(rect.width + delta.x, min_w, limit))
    };

    let (y, height) = if corner.moves_top_edge() {
        let bottom = rect.bottom();
        let y = clamp_position(rect.y + delta.y, bottom - min_h);
        (y, bottom - y)
    } else {
        let limit = (bound_h - rect.y).max(min_h);
        (rect.y, clamp_length(rect.height + delta.y, min_h, limit))
    };

    Rect::new(x, y, width, height)
}
