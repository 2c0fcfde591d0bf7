//! Layout configuration module.
//!
//! Handles loading, validating, and merging a layout file (`layout.toml` by
//! convention). The layout file stands in for the interactive design step:
//! it places the text box on the sample image, styles it, and picks the
//! export preset. Stock defaults are overridden by whatever the file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [text_box]
//! # x = 120.0               # Left edge in sample pixels (omit to center)
//! # y = 40.0                # Top edge in sample pixels (omit to center)
//! width = 300.0
//! height = 100.0
//! text = "שלום עולם Hello World"   # Placeholder shown while designing
//!
//! [style]
//! font_size = 36.0
//! color = "#000000"
//! stroke_color = "#ffffff"
//! stroke_width = 2.0
//! align = "center"          # left | center | right
//! font_family = "David"
//!
//! [export]
//! resolution = "180"        # "180" | "300"
//! format = "png"            # png | jpg | pdf
//! jpeg_quality = 90         # 1-100
//!
//! [render]
//! font_scale = "horizontal" # horizontal | uniform
//!
//! [render.shadow]           # Used only when stroke_width is 0
//! dx = 2.0
//! dy = 2.0
//! blur = 4.0
//! opacity = 0.3
//!
//! [fonts]
//! files = []                # Extra TTF/OTF files, relative to this file
//! ```
//!
//! ## Partial Configuration
//!
//! Layout files are sparse, override just the values you want:
//!
//! ```toml
//! [style]
//! font_size = 48.0
//! stroke_width = 0.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::geometry::{
    Align, Color, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, DEFAULT_TEXT, Dimensions, DropShadow,
    FontScalePolicy, MIN_BOX_HEIGHT, MIN_BOX_WIDTH, Point, Rect, TextBox, TextBoxStyle,
    center_in, clamp_rect, clamp_to_bounds,
};
use crate::imaging::{ExportFormat, ExportSpec, Quality, RenderPlan, Resolution};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Layout configuration.
///
/// All fields have defaults matching a freshly loaded sample image. Unknown
/// keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub text_box: TextBoxConfig,
    pub style: StyleConfig,
    pub export: ExportConfig,
    pub render: RenderConfig,
    pub fonts: FontsConfig,
}

/// Text box placement in sample-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextBoxConfig {
    /// Left edge. Absent means centered horizontally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Top edge. Absent means centered vertically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl Default for TextBoxConfig {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_BOX_WIDTH,
            height: DEFAULT_BOX_HEIGHT,
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub font_size: f64,
    pub color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub align: Align,
    pub font_family: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig::from(&TextBoxStyle::default())
    }
}

impl From<&TextBoxStyle> for StyleConfig {
    fn from(style: &TextBoxStyle) -> Self {
        Self {
            font_size: style.font_size,
            color: style.color,
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width,
            align: style.align,
            font_family: style.font_family.clone(),
        }
    }
}

impl StyleConfig {
    pub fn to_style(&self) -> TextBoxStyle {
        TextBoxStyle {
            font_size: self.font_size,
            color: self.color,
            stroke_color: self.stroke_color,
            stroke_width: self.stroke_width,
            align: self.align,
            font_family: self.font_family.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub resolution: Resolution,
    pub format: ExportFormat,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            format: ExportFormat::default(),
            jpeg_quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub font_scale: FontScalePolicy,
    /// Drop shadow for unstroked text, in sample-image pixels.
    pub shadow: DropShadow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    /// Font files to register. Relative paths resolve against the layout
    /// file's directory.
    pub files: Vec<PathBuf>,
}

fn check(ok: bool, message: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Validation(message.into()))
    }
}

impl LayoutConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.text_box;
        check(
            b.x.is_none_or(f64::is_finite) && b.y.is_none_or(f64::is_finite),
            "text_box.x and text_box.y must be finite",
        )?;
        check(
            b.width >= MIN_BOX_WIDTH,
            "text_box.width must be at least 50",
        )?;
        check(
            b.height >= MIN_BOX_HEIGHT,
            "text_box.height must be at least 30",
        )?;

        let s = &self.style;
        check(
            s.font_size.is_finite() && s.font_size > 0.0,
            "style.font_size must be positive",
        )?;
        check(
            s.stroke_width.is_finite() && s.stroke_width >= 0.0,
            "style.stroke_width must not be negative",
        )?;
        check(
            !s.font_family.trim().is_empty(),
            "style.font_family must not be empty",
        )?;

        check(
            (1..=100).contains(&self.export.jpeg_quality),
            "export.jpeg_quality must be 1-100",
        )?;

        let shadow = &self.render.shadow;
        check(
            shadow.dx.is_finite() && shadow.dy.is_finite(),
            "render.shadow offsets must be finite",
        )?;
        check(
            shadow.blur.is_finite() && shadow.blur >= 0.0,
            "render.shadow.blur must not be negative",
        )?;
        check(
            (0.0..=1.0).contains(&shadow.opacity),
            "render.shadow.opacity must be 0-1",
        )?;
        Ok(())
    }

    /// The designed text box on a sample of size `design`, clamped inside it.
    pub fn text_box(&self, design: Dimensions) -> TextBox {
        let b = &self.text_box;
        let size = clamp_rect(Rect::new(0.0, 0.0, b.width, b.height), design);
        let centered = center_in(design, (size.width, size.height));
        let origin = Point::new(b.x.unwrap_or(centered.x), b.y.unwrap_or(centered.y));
        let text_box = TextBox {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            text: b.text.clone(),
            style: self.style.to_style(),
        };
        clamp_to_bounds(&text_box, design)
    }

    /// Export preset for a sample of size `design`; orientation follows it.
    pub fn export_spec(&self, design: Dimensions) -> ExportSpec {
        ExportSpec::for_sample(design, self.export.resolution, self.export.format)
            .with_quality(Quality::new(self.export.jpeg_quality))
    }

    /// Everything a batch needs to render against a sample of size `design`.
    pub fn render_plan(&self, design: Dimensions) -> RenderPlan {
        RenderPlan::new(design, &self.text_box(design), self.export_spec(design))
            .with_font_scale(self.render.font_scale)
            .with_shadow(self.render.shadow)
    }

    /// Font files with relative paths resolved against `base_dir`.
    pub fn font_files(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.fonts
            .files
            .iter()
            .map(|f| {
                if f.is_absolute() {
                    f.clone()
                } else {
                    base_dir.join(f)
                }
            })
            .collect()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(LayoutConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a layout file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LayoutConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LayoutConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a layout file merged over stock defaults, or the defaults alone
/// when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock layout file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# textstamp layout
# =================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Text box, in pixels of the sample image
# ---------------------------------------------------------------------------
[text_box]
# Top-left corner. Leave unset to center the box on the sample image.
# x = 120.0
# y = 40.0

# Box size. Minimum 50 x 30; capped at the sample image size.
width = 300.0
height = 100.0

# Placeholder text used while designing. Batch renders use the text file.
text = "שלום עולם Hello World"

# ---------------------------------------------------------------------------
# Text style
# ---------------------------------------------------------------------------
[style]
# Font size in sample-image pixels.
font_size = 36.0

# Colors as #rgb, #rrggbb or #rrggbbaa.
color = "#000000"
stroke_color = "#ffffff"

# Outline width in sample-image pixels. 0 disables the outline and
# enables the drop shadow from [render.shadow].
stroke_width = 2.0

# Horizontal alignment inside the box: left, center or right.
align = "center"

# Font family. Falls back to sans-serif when unavailable.
font_family = "David"

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Print resolution preset:
#   "180" -> 1488 x 2126 px portrait
#   "300" -> 2480 x 3543 px portrait
# Landscape samples swap width and height.
resolution = "180"

# Output format: png (ZIP of PNGs), jpg (ZIP of JPEGs) or pdf (one page each).
format = "png"

# JPEG encoding quality (1 = worst, 100 = best).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# How font size and outline scale onto the export canvas:
#   horizontal -> by the horizontal scale factor
#   uniform    -> by the smaller of the two scale factors
font_scale = "horizontal"

# Drop shadow drawn behind unstroked text, in sample-image pixels.
[render.shadow]
dx = 2.0
dy = 2.0
blur = 4.0
opacity = 0.3

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# Extra TTF/OTF files to make available. Each registers under its file name
# (without extension) and its own family name.
# Relative paths resolve against this file's directory.
files = []
"##
}
