//! Page rasterization and background re-encoding

use crate::error::{OverlayError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use tracing::debug;

/// A rasterized page, flattened to opaque RGB
#[derive(Debug, Clone)]
pub struct RasterPage {
    image: RgbImage,
}

impl RasterPage {
    /// Wrap an RGB bitmap; an empty bitmap means the surface was never drawn
    pub fn new(image: RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::RenderSurface(format!(
                "rasterized page is empty ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(Self { image })
    }

    /// Build from raw RGBA bytes, compositing transparent pixels onto white
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        let rgba = RgbaImage::from_raw(width, height, bytes).ok_or_else(|| {
            OverlayError::RenderSurface(format!(
                "bitmap of {len} bytes does not hold {width}x{height} RGBA pixels"
            ))
        })?;

        let image = RgbImage::from_fn(width, height, |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
            Rgb([blend(r), blend(g), blend(b)])
        });
        Self::new(image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as baseline JPEG at the given quality (1-100)
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let quality = quality.clamp(1, 100);
        let mut out = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
            encoder
                .encode_image(&self.image)
                .map_err(|e| OverlayError::ImageEncode(e.to_string()))?;
        }
        debug!(
            "Encoded {}x{} background as {} bytes of JPEG (quality {})",
            self.width(),
            self.height(),
            out.len(),
            quality
        );
        Ok(out)
    }
}

/// Turns page 1 of a source document into a bitmap
///
/// Implementations own every surface they allocate for a call and release it
/// before returning, so one rasterizer may serve concurrent calls.
pub trait PageRasterizer {
    /// Rasterize the first page of `source` at `scale` pixels per point
    fn rasterize_first_page(&self, source: &[u8], scale: f32) -> Result<RasterPage>;
}

impl<R: PageRasterizer + ?Sized> PageRasterizer for &R {
    fn rasterize_first_page(&self, source: &[u8], scale: f32) -> Result<RasterPage> {
        (**self).rasterize_first_page(source, scale)
    }
}

impl<R: PageRasterizer + ?Sized> PageRasterizer for Box<R> {
    fn rasterize_first_page(&self, source: &[u8], scale: f32) -> Result<RasterPage> {
        (**self).rasterize_first_page(source, scale)
    }
}
