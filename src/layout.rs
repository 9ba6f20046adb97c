//! Placement of field values on the page
//!
//! All coordinates here are in the template's space: points with the origin
//! at the top-left of the page and y growing downwards. Conversion to PDF
//! user space happens in the drawing module.

use crate::constants::BASELINE_OFFSET_DIVISOR;
use crate::font::FontMetrics;
use crate::style::{Alignment, OverlayStyle};
use crate::template::{FieldDefinition, TemplateLayout};
use crate::text::wrap_text;
use crate::values::FieldValues;
use tracing::{debug, trace};

/// One line of text ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub field_id: String,
    pub text: String,
    /// Horizontal anchor; its meaning depends on `alignment`
    pub x: f32,
    /// Baseline, measured from the top of the page
    pub y: f32,
    pub alignment: Alignment,
    pub font_size: f32,
}

impl PlacedLine {
    /// Left edge of the line once aligned around its anchor
    pub fn left_edge(&self, metrics: &dyn FontMetrics) -> f32 {
        match self.alignment {
            Alignment::Left => self.x,
            Alignment::Center => self.x - metrics.text_width(&self.text, self.font_size) / 2.0,
            Alignment::Right => self.x - metrics.text_width(&self.text, self.font_size),
        }
    }
}

/// Horizontal anchor of a field for its alignment
pub fn anchor_x(field: &FieldDefinition, padding: f32) -> f32 {
    let p = &field.position;
    match field.text_position {
        Alignment::Left => p.x + padding,
        Alignment::Center => p.x + p.width / 2.0,
        Alignment::Right => p.x + p.width - padding,
    }
}

/// Lay out every field that has a value, in field order
pub fn plan_overlay(
    layout: &TemplateLayout,
    values: &FieldValues,
    style: &OverlayStyle,
    metrics: &dyn FontMetrics,
) -> Vec<PlacedLine> {
    let mut placed = Vec::new();

    for field in &layout.fields {
        let Some(text) = values.text_for(&field.id) else {
            trace!("No value for field '{}'", field.id);
            continue;
        };
        placed.extend(place_field(field, &text, style, metrics));
    }

    debug!("Planned {} overlay lines", placed.len());
    placed
}

/// Lay out a single field's text
pub fn place_field(
    field: &FieldDefinition,
    text: &str,
    style: &OverlayStyle,
    metrics: &dyn FontMetrics,
) -> Vec<PlacedLine> {
    let font_size = field.resolved_font_size(style.default_font_size);
    let x = anchor_x(field, style.padding);
    let p = &field.position;

    let line = |text: String, y: f32| PlacedLine {
        field_id: field.id.clone(),
        text,
        x,
        y,
        alignment: field.text_position,
        font_size,
    };

    if !field.kind.is_multiline() {
        let y = p.y + p.height / 2.0 + font_size / BASELINE_OFFSET_DIVISOR;
        return vec![line(single_line(text), y)];
    }

    let wrap_width = p.width - 2.0 * style.padding;
    let line_height = font_size * style.line_height_multiplier;
    let first_baseline = p.y + style.padding + font_size / BASELINE_OFFSET_DIVISOR;
    let bottom_limit = p.y + p.height - style.padding;

    let mut lines = Vec::new();
    for (i, wrapped) in wrap_text(text, wrap_width, font_size, metrics)
        .into_iter()
        .enumerate()
    {
        let y = first_baseline + i as f32 * line_height;
        if y > bottom_limit {
            debug!(
                "Field '{}' overflows its box; dropping lines from {}",
                field.id, i
            );
            break;
        }
        if !wrapped.is_empty() {
            lines.push(line(wrapped, y));
        }
    }
    lines
}

/// Collapse line breaks into spaces for fields drawn on one line
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}
