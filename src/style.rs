//! Styling structures for overlay text

use crate::constants::{DEFAULT_FONT_SIZE, DEFAULT_LINE_HEIGHT_MULTIPLIER, DEFAULT_PADDING};
use serde::Deserialize;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values should be 0.0-1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Horizontal text alignment, persisted as a field's `textPosition`
///
/// Anything other than `"center"` or `"right"` (including a missing value)
/// aligns left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Option<String>> for Alignment {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("center") => Self::Center,
            Some("right") => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Styling shared by every field of an overlay pass
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    /// Inset from the field box edges
    pub padding: f32,
    /// Font size for fields that do not configure one
    pub default_font_size: f32,
    /// Multiplied by the font size to get the line advance of wrapped text
    pub line_height_multiplier: f32,
    pub text_color: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            default_font_size: DEFAULT_FONT_SIZE,
            line_height_multiplier: DEFAULT_LINE_HEIGHT_MULTIPLIER,
            text_color: Color::black(),
        }
    }
}

impl OverlayStyle {
    /// Set the field padding
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Set the fallback font size
    pub fn with_default_font_size(mut self, size: f32) -> Self {
        self.default_font_size = size;
        self
    }

    /// Set the line height multiplier
    pub fn with_line_height_multiplier(mut self, multiplier: f32) -> Self {
        self.line_height_multiplier = multiplier;
        self
    }

    /// Set the text color
    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }
}
