//! Rasterization through the pdfium library

use crate::error::{OverlayError, Result};
use crate::raster::{PageRasterizer, RasterPage};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Rasterizes with pdfium, loaded from the system or from a given directory
///
/// The library is bound for each call, so no pdfium state outlives a render.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Use the system-wide pdfium library
    pub fn new() -> Self {
        Self::default()
    }

    /// Load pdfium from `dir` instead of the system library path
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| OverlayError::RasterizerUnavailable(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    #[instrument(skip(self, source), fields(len = source.len()))]
    fn rasterize_first_page(&self, source: &[u8], scale: f32) -> Result<RasterPage> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(source, None)
            .map_err(|e| OverlayError::DocumentDecode(e.to_string()))?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(OverlayError::EmptyDocument);
        }
        let page = pages
            .get(0)
            .map_err(|e| OverlayError::DocumentDecode(e.to_string()))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| OverlayError::RenderSurface(e.to_string()))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        debug!("Rasterized page 1 to {}x{} at scale {}", width, height, scale);

        RasterPage::from_rgba(width, height, bitmap.as_rgba_bytes())
    }
}
