//! Template layout data model
//!
//! Layouts are persisted as JSON (`fields`, `pageWidth`, `pageHeight`) and
//! validated once here. Everything downstream works with the typed structs.

use crate::error::{OverlayError, Result};
use crate::style::Alignment;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Rectangle a value may be drawn into, in page points with a top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FieldPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FieldPosition {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The kind of input a field holds, which decides how its value is laid out
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line text, word-wrapped inside the field box
    Textarea,
    /// Any other type name (`number`, `date`, ...); drawn as a single line
    Other(String),
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            _ => Self::Other(value),
        }
    }
}

impl FieldKind {
    /// Whether values of this kind wrap across several lines
    pub fn is_multiline(&self) -> bool {
        match self {
            Self::Textarea => true,
            Self::Text | Self::Other(_) => false,
        }
    }
}

/// A named, positioned placeholder on a template
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub text_position: Alignment,
    #[serde(default)]
    pub font_size: Option<f32>,
    /// Drawing record column this field is filled from
    #[serde(default, alias = "targetFieldf", alias = "bindsTo")]
    pub target_field: Option<String>,
    pub position: FieldPosition,
}

impl FieldDefinition {
    /// Create a left-aligned field with no explicit font size
    pub fn new(id: impl Into<String>, kind: FieldKind, position: FieldPosition) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind,
            text_position: Alignment::Left,
            font_size: None,
            target_field: None,
            position,
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the horizontal alignment
    pub fn with_text_position(mut self, alignment: Alignment) -> Self {
        self.text_position = alignment;
        self
    }

    /// Set the font size
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Bind the field to a drawing record column
    pub fn with_target_field(mut self, target: impl Into<String>) -> Self {
        self.target_field = Some(target.into());
        self
    }

    /// Font size to draw with; a missing or zero size falls back to `default`
    pub fn resolved_font_size(&self, default: f32) -> f32 {
        match self.font_size {
            Some(size) if size != 0.0 => size,
            _ => default,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(OverlayError::InvalidLayout(
                "field id must not be empty".to_string(),
            ));
        }

        let p = &self.position;
        if ![p.x, p.y, p.width, p.height].iter().all(|v| v.is_finite()) {
            return Err(OverlayError::InvalidLayout(format!(
                "field '{}' has a non-finite position",
                self.id
            )));
        }
        if p.width < 0.0 || p.height < 0.0 {
            return Err(OverlayError::InvalidLayout(format!(
                "field '{}' has a negative size ({} x {})",
                self.id, p.width, p.height
            )));
        }

        if let Some(size) = self.font_size {
            if !size.is_finite() || size < 0.0 {
                return Err(OverlayError::InvalidLayout(format!(
                    "field '{}' has an invalid font size {}",
                    self.id, size
                )));
            }
        }

        Ok(())
    }
}

/// The placeable fields of one template plus its output page size
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLayout {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    pub page_width: f32,
    pub page_height: f32,
}

impl TemplateLayout {
    /// Build and validate a layout
    pub fn new(fields: Vec<FieldDefinition>, page_width: f32, page_height: f32) -> Result<Self> {
        let layout = Self {
            fields,
            page_width,
            page_height,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Parse and validate a layout from its persisted JSON form
    #[instrument(skip(json), fields(len = json.len()))]
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        debug!("Loaded template layout with {} fields", layout.fields.len());
        Ok(layout)
    }

    /// Parse and validate a layout from an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let layout: Self = serde_json::from_value(value)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Check page dimensions and every field
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("pageWidth", self.page_width), ("pageHeight", self.page_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OverlayError::InvalidLayout(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.id.as_str()) {
                return Err(OverlayError::InvalidLayout(format!(
                    "duplicate field id '{}'",
                    field.id
                )));
            }
        }

        Ok(())
    }
}
