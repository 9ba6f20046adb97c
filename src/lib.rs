//! Stamp template field values onto PDF pages, built on lopdf
//!
//! A [`TemplateLayout`] positions named fields on a page. [`OverlayRenderer`]
//! rasterizes page 1 of a source document, embeds it as the background of a
//! new page and draws each field's value at its configured position. The
//! [`FieldOverlay`] extension trait draws the same text onto any existing
//! page without rasterizing.

use lopdf::{Document, ObjectId, content::Operation};
use tracing::{debug, instrument};

pub mod binding;
pub mod constants;
pub mod document;
mod drawing;
pub mod error;
pub mod export;
pub mod font;
pub mod layout;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod raster;
pub mod renderer;
pub mod style;
pub mod template;
mod text;
pub mod values;

pub use binding::DrawingRecord;
pub use error::{OverlayError, Result};
pub use export::{ExportedPdf, WebhookPayload};
pub use font::{FontMetrics, HelveticaMetrics};
pub use layout::PlacedLine;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
pub use raster::{PageRasterizer, RasterPage};
pub use renderer::{OverlayRenderer, RenderOptions};
pub use style::{Alignment, Color, OverlayStyle};
pub use template::{FieldDefinition, FieldKind, FieldPosition, TemplateLayout};
pub use values::{FieldValue, FieldValues};

use constants::FONT_RESOURCE_NAME;

/// Extension trait for lopdf::Document to draw field values onto a page
pub trait FieldOverlay {
    /// Draw every field of `layout` that has a value onto a page
    ///
    /// Field coordinates are measured from the top-left corner of the page's
    /// media box. The Helvetica font is registered under
    /// [`FONT_RESOURCE_NAME`](constants::FONT_RESOURCE_NAME), or a numbered
    /// variant of it when the page already uses that name, and existing
    /// content is wrapped in `q`/`Q`. Returns the number of text lines drawn.
    fn draw_fields(
        &mut self,
        page_id: ObjectId,
        layout: &TemplateLayout,
        values: &FieldValues,
        style: &OverlayStyle,
    ) -> Result<usize>;

    /// Create the text operations without adding them to the document
    ///
    /// The operations reference the Helvetica font under the resource name
    /// [`FONT_RESOURCE_NAME`](constants::FONT_RESOURCE_NAME).
    fn create_field_content(
        &self,
        page_id: ObjectId,
        layout: &TemplateLayout,
        values: &FieldValues,
        style: &OverlayStyle,
    ) -> Result<Vec<Operation>>;
}

impl FieldOverlay for Document {
    #[instrument(skip(self, layout, values, style), fields(fields = layout.fields.len()))]
    fn draw_fields(
        &mut self,
        page_id: ObjectId,
        layout: &TemplateLayout,
        values: &FieldValues,
        style: &OverlayStyle,
    ) -> Result<usize> {
        let [left, _, _, top] = document::media_box(self, page_id)?;
        let lines = layout::plan_overlay(layout, values, style, &HelveticaMetrics);
        if lines.is_empty() {
            debug!("No field values to draw");
            return Ok(0);
        }

        let font_name = document::unused_resource_name(self, page_id, "Font", FONT_RESOURCE_NAME)?;
        let font_id = self.add_object(document::helvetica_font());
        document::add_page_resource(self, page_id, "Font", &font_name, font_id)?;

        let operations = drawing::text_operations(
            &lines,
            &font_name,
            style.text_color,
            &HelveticaMetrics,
            (left, top),
        );
        drawing::isolate_page_contents(self, page_id)?;
        drawing::add_operations_to_page(self, page_id, operations)?;

        Ok(lines.len())
    }

    fn create_field_content(
        &self,
        page_id: ObjectId,
        layout: &TemplateLayout,
        values: &FieldValues,
        style: &OverlayStyle,
    ) -> Result<Vec<Operation>> {
        let [left, _, _, top] = document::media_box(self, page_id)?;
        let lines = layout::plan_overlay(layout, values, style, &HelveticaMetrics);
        Ok(drawing::text_operations(
            &lines,
            FONT_RESOURCE_NAME,
            style.text_color,
            &HelveticaMetrics,
            (left, top),
        ))
    }
}

/// Render a filled document using the system pdfium library
#[cfg(feature = "pdfium")]
pub fn render(source: &[u8], layout: &TemplateLayout, values: &FieldValues) -> Result<Vec<u8>> {
    OverlayRenderer::new(PdfiumRasterizer::new()).render(source, layout, values)
}

/// Render with the system pdfium library and return the base64 payload
#[cfg(feature = "pdfium")]
pub fn render_and_encode(
    source: &[u8],
    layout: &TemplateLayout,
    values: &FieldValues,
) -> Result<String> {
    OverlayRenderer::new(PdfiumRasterizer::new()).render_and_encode(source, layout, values)
}
