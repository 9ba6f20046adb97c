//! The overlay export pipeline
//!
//! Rasterize page 1 of the source, embed it as a full-page background in a
//! new landscape document, then stamp the field values on top.

use crate::FieldOverlay;
use crate::constants::{
    BACKGROUND_RESOURCE_NAME, DEFAULT_JPEG_QUALITY, MIN_RASTER_SCALE, RASTER_SCALE,
};
use crate::document::{add_page_resource, jpeg_image_stream, new_landscape_document};
use crate::drawing::{add_operations_to_page, background_operations};
use crate::error::{OverlayError, Result};
use crate::export::ExportedPdf;
use crate::raster::PageRasterizer;
use crate::style::OverlayStyle;
use crate::template::TemplateLayout;
use crate::values::FieldValues;
use lopdf::Document;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Settings for one renderer
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Supersampling factor for the background; values below 2 are raised to 2
    pub scale: f32,
    /// JPEG quality of the background, 1-100
    pub jpeg_quality: u8,
    pub style: OverlayStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: RASTER_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            style: OverlayStyle::default(),
        }
    }
}

impl RenderOptions {
    /// Set the rasterization scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the background JPEG quality
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the overlay text style
    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale >= MIN_RASTER_SCALE {
            self.scale
        } else {
            warn!(
                "Raster scale {} is below {}; using {}",
                self.scale, MIN_RASTER_SCALE, MIN_RASTER_SCALE
            );
            MIN_RASTER_SCALE
        }
    }
}

/// Renders filled templates using a page rasterizer
///
/// A renderer holds no per-call state; it can be shared between threads
/// whenever its rasterizer can.
#[derive(Debug, Clone)]
pub struct OverlayRenderer<R> {
    rasterizer: R,
    options: RenderOptions,
}

impl<R: PageRasterizer> OverlayRenderer<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            options: RenderOptions::default(),
        }
    }

    /// Replace the render options
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render the filled document and return its bytes
    #[instrument(skip_all, fields(source_len = source.len(), fields = layout.fields.len()))]
    pub fn render(
        &self,
        source: &[u8],
        layout: &TemplateLayout,
        values: &FieldValues,
    ) -> Result<Vec<u8>> {
        check_source(source)?;

        let scale = self.options.effective_scale();
        let raster = self.rasterizer.rasterize_first_page(source, scale)?;
        debug!(
            "Background raster is {}x{} px",
            raster.width(),
            raster.height()
        );
        let jpeg = raster.to_jpeg(self.options.jpeg_quality)?;

        let mut out = new_landscape_document(layout.page_width, layout.page_height);
        let image_id = out
            .doc
            .add_object(jpeg_image_stream(jpeg, raster.width(), raster.height()));
        drop(raster);

        add_page_resource(
            &mut out.doc,
            out.page_id,
            "XObject",
            BACKGROUND_RESOURCE_NAME,
            image_id,
        )?;
        add_operations_to_page(
            &mut out.doc,
            out.page_id,
            background_operations(
                BACKGROUND_RESOURCE_NAME,
                layout.page_width,
                layout.page_height,
                out.media_height,
            ),
        )?;

        let drawn = out
            .doc
            .draw_fields(out.page_id, layout, values, &self.options.style)?;
        debug!("Stamped {} lines of field text", drawn);

        let mut bytes = Vec::new();
        out.doc.save_to(&mut bytes)?;
        debug!("Serialized output document ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Render and return the base64 payload of the document's data URI
    pub fn render_and_encode(
        &self,
        source: &[u8],
        layout: &TemplateLayout,
        values: &FieldValues,
    ) -> Result<String> {
        Ok(self.render_to_export(source, layout, values, None)?.to_base64())
    }

    /// Render into an [`ExportedPdf`] named `filename` (or the default name)
    pub fn render_to_export(
        &self,
        source: &[u8],
        layout: &TemplateLayout,
        values: &FieldValues,
        filename: Option<&str>,
    ) -> Result<ExportedPdf> {
        let bytes = self.render(source, layout, values)?;
        Ok(ExportedPdf::new(filename, bytes))
    }
}

/// Make sure the source parses and has at least one page
fn check_source(source: &[u8]) -> Result<()> {
    let doc = Document::load_mem(source)
        .map_err(|e| OverlayError::DocumentDecode(e.to_string()))?;
    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(OverlayError::EmptyDocument);
    }
    if page_count > 1 {
        debug!("Source has {} pages; only page 1 is rendered", page_count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::page_size;
    use crate::raster::RasterPage;
    use crate::style::Alignment;
    use crate::template::{FieldDefinition, FieldKind, FieldPosition};
    use image::{Rgb, RgbImage};
    use lopdf::content::Content;
    use lopdf::{Object, dictionary};
    use std::sync::Mutex;

    /// Produces a blank raster sized from page 1's media box and records the
    /// scale it was asked for.
    #[derive(Default)]
    struct StubRasterizer {
        scales: Mutex<Vec<f32>>,
    }

    impl PageRasterizer for StubRasterizer {
        fn rasterize_first_page(&self, source: &[u8], scale: f32) -> Result<RasterPage> {
            self.scales.lock().unwrap().push(scale);
            let doc = Document::load_mem(source).unwrap();
            let first = *doc.get_pages().get(&1).unwrap();
            let (w, h) = page_size(&doc, first).unwrap();
            RasterPage::new(RgbImage::from_pixel(
                (w * scale) as u32,
                (h * scale) as u32,
                Rgb([255, 255, 255]),
            ))
        }
    }

    struct FailingRasterizer;

    impl PageRasterizer for FailingRasterizer {
        fn rasterize_first_page(&self, _source: &[u8], _scale: f32) -> Result<RasterPage> {
            Err(OverlayError::RenderSurface("out of memory".to_string()))
        }
    }

    /// Build a source PDF whose pages have the given sizes
    fn source_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = sizes
            .iter()
            .map(|&(w, h)| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => sizes.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn edge_layout() -> TemplateLayout {
        TemplateLayout::new(
            vec![
                FieldDefinition::new(
                    "job",
                    FieldKind::Text,
                    FieldPosition::new(100.0, 50.0, 120.0, 20.0),
                ),
                FieldDefinition::new(
                    "qty",
                    FieldKind::Other("number".to_string()),
                    FieldPosition::new(300.0, 50.0, 60.0, 20.0),
                )
                .with_text_position(Alignment::Right),
                FieldDefinition::new(
                    "notes",
                    FieldKind::Textarea,
                    FieldPosition::new(100.0, 200.0, 200.0, 60.0),
                ),
            ],
            842.0,
            595.0,
        )
        .unwrap()
    }

    /// Decoded operations of the only output page
    fn output_operations(bytes: &[u8]) -> Vec<lopdf::content::Operation> {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    /// `(text, x, y)` for every Tj, with `x, y` taken from the preceding Td
    fn placed_text(bytes: &[u8]) -> Vec<(String, f32, f32)> {
        let mut placed = Vec::new();
        let mut position = (0.0, 0.0);
        for op in output_operations(bytes) {
            match op.operator.as_str() {
                "Td" => {
                    position = (
                        op.operands[0].as_float().unwrap(),
                        op.operands[1].as_float().unwrap(),
                    )
                }
                "Tj" => {
                    let text = String::from_utf8_lossy(op.operands[0].as_str().unwrap());
                    placed.push((text.into_owned(), position.0, position.1));
                }
                _ => {}
            }
        }
        placed
    }

    #[test]
    fn test_left_aligned_value_placement() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let values = FieldValues::new().with("job", "ABC123");

        let bytes = renderer
            .render(&source_pdf(&[(842, 595)]), &edge_layout(), &values)
            .unwrap();

        let placed = placed_text(&bytes);
        assert_eq!(placed.len(), 1);
        let (text, x, y) = &placed[0];
        assert_eq!(text, "ABC123");
        assert!((x - 104.0).abs() < 0.01);
        // baseline 50 + 10 + 4 from the top of a 595pt page
        assert!((y - (595.0 - 64.0)).abs() < 0.01);
    }

    #[test]
    fn test_background_fills_page() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let bytes = renderer
            .render(&source_pdf(&[(842, 595)]), &edge_layout(), &FieldValues::new())
            .unwrap();

        let ops = output_operations(&bytes);
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let matrix: Vec<f32> = cm.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(matrix, vec![842.0, 0.0, 0.0, 595.0, 0.0, 0.0]);
        assert!(ops.iter().any(|op| op.operator == "Do"));
        assert!(!ops.iter().any(|op| op.operator == "Tj"));

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        assert_eq!(page_size(&doc, page_id).unwrap(), (842.0, 595.0));
    }

    #[test]
    fn test_background_image_is_jpeg_at_scale() {
        let rasterizer = StubRasterizer::default();
        let renderer = OverlayRenderer::new(&rasterizer);
        let bytes = renderer
            .render(&source_pdf(&[(400, 300)]), &edge_layout(), &FieldValues::new())
            .unwrap();

        assert_eq!(*rasterizer.scales.lock().unwrap(), vec![2.0]);

        let doc = Document::load_mem(&bytes).unwrap();
        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 800);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 600);
        assert_eq!(
            image.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
        assert_eq!(&image.content[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_only_first_page_is_rasterized() {
        let rasterizer = StubRasterizer::default();
        let renderer = OverlayRenderer::new(&rasterizer);
        let bytes = renderer
            .render(
                &source_pdf(&[(300, 200), (1000, 1000)]),
                &edge_layout(),
                &FieldValues::new(),
            )
            .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 600);
    }

    #[test]
    fn test_textarea_and_right_alignment() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let values = FieldValues::new()
            .with("qty", 12_i64)
            .with(
                "notes",
                "Chamfer all edges\nholes to be drilled after bending, deburr both sides, \
                 check flatness against the master gauge before dispatch to site and record \
                 the serial number on the traveller sheet",
            );

        let bytes = renderer
            .render(&source_pdf(&[(842, 595)]), &edge_layout(), &values)
            .unwrap();
        let placed = placed_text(&bytes);

        let qty = placed.iter().find(|(t, _, _)| t == "12").unwrap();
        // right anchor 356 minus the width of "12" (2 * 556/1000 * 12)
        assert!((qty.1 - (356.0 - 13.344)).abs() < 0.01);

        let notes: Vec<_> = placed.iter().filter(|(t, _, _)| t != "12").collect();
        assert_eq!(notes[0].0, "Chamfer all edges");
        assert_eq!(notes.len(), 4);
        for (i, (_, x, y)) in notes.iter().enumerate() {
            assert!((x - 104.0).abs() < 0.01);
            let top_down = 200.0 + 4.0 + 4.0 + i as f32 * 14.4;
            assert!((y - (595.0 - top_down)).abs() < 0.01);
            assert!(595.0 - y <= 200.0 + 60.0 - 4.0);
        }
    }

    #[test]
    fn test_repeat_renders_place_text_identically() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let source = source_pdf(&[(842, 595)]);
        let values = FieldValues::new().with("job", "J-77").with("qty", 3_i64);

        let first = renderer.render(&source, &edge_layout(), &values).unwrap();
        let second = renderer.render(&source, &edge_layout(), &values).unwrap();
        assert_eq!(placed_text(&first), placed_text(&second));
    }

    #[test]
    fn test_portrait_layout_gets_landscape_page() {
        let layout = TemplateLayout::new(
            vec![FieldDefinition::new(
                "job",
                FieldKind::Text,
                FieldPosition::new(10.0, 10.0, 100.0, 20.0),
            )],
            595.0,
            842.0,
        )
        .unwrap();
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let bytes = renderer
            .render(
                &source_pdf(&[(595, 842)]),
                &layout,
                &FieldValues::new().with("job", "X"),
            )
            .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        assert_eq!(page_size(&doc, page_id).unwrap(), (842.0, 595.0));

        let placed = placed_text(&bytes);
        assert!((placed[0].2 - (595.0 - 24.0)).abs() < 0.01);
    }

    #[test]
    fn test_render_and_encode_matches_render() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let source = source_pdf(&[(842, 595)]);
        let values = FieldValues::new().with("job", "ABC123");

        let bytes = renderer.render(&source, &edge_layout(), &values).unwrap();
        let encoded = renderer
            .render_and_encode(&source, &edge_layout(), &values)
            .unwrap();
        assert_eq!(encoded, ExportedPdf::new(None, bytes).to_base64());
    }

    #[test]
    fn test_render_to_export_names_file() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let export = renderer
            .render_to_export(
                &source_pdf(&[(842, 595)]),
                &edge_layout(),
                &FieldValues::new(),
                None,
            )
            .unwrap();
        assert_eq!(export.filename, "edge-template-filled.pdf");
        assert!(export.bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_garbage_source_is_decode_error() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let err = renderer
            .render(b"not a pdf", &edge_layout(), &FieldValues::new())
            .unwrap_err();
        assert!(matches!(err, OverlayError::DocumentDecode(_)));
    }

    #[test]
    fn test_zero_pages_is_empty_document_error() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let err = renderer
            .render(&source_pdf(&[]), &edge_layout(), &FieldValues::new())
            .unwrap_err();
        assert!(matches!(err, OverlayError::EmptyDocument));
    }

    #[test]
    fn test_rasterizer_failure_is_terminal() {
        let renderer = OverlayRenderer::new(FailingRasterizer);
        let err = renderer
            .render(
                &source_pdf(&[(842, 595)]),
                &edge_layout(),
                &FieldValues::new().with("job", "A"),
            )
            .unwrap_err();
        assert!(matches!(err, OverlayError::RenderSurface(_)));
    }

    #[test]
    fn test_low_scale_is_raised() {
        let rasterizer = StubRasterizer::default();
        let renderer = OverlayRenderer::new(&rasterizer)
            .with_options(RenderOptions::default().with_scale(1.0));
        renderer
            .render(&source_pdf(&[(100, 100)]), &edge_layout(), &FieldValues::new())
            .unwrap();
        assert_eq!(*rasterizer.scales.lock().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_options_from_json() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"scale": 3, "style": {"padding": 6}}"#).unwrap();
        assert_eq!(options.scale, 3.0);
        assert_eq!(options.jpeg_quality, 95);
        assert_eq!(options.style.padding, 6.0);
        assert_eq!(options.style.default_font_size, 12.0);
    }

    #[test]
    fn test_concurrent_renders() {
        let renderer = OverlayRenderer::new(StubRasterizer::default());
        let source = source_pdf(&[(842, 595)]);
        let layout = edge_layout();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let (renderer, source, layout) = (&renderer, &source, &layout);
                    s.spawn(move || {
                        let values = FieldValues::new().with("job", format!("JOB-{i}"));
                        placed_text(&renderer.render(source, layout, &values).unwrap())
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let placed = handle.join().unwrap();
                assert_eq!(placed[0].0, format!("JOB-{i}"));
            }
        });
    }
}
