//! Constants for overlay placement and rendering

/// Default font size in points when a field does not configure one
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Horizontal and vertical padding inside a field box, in points
pub const DEFAULT_PADDING: f32 = 4.0;

/// Default line height multiplier for multi-line fields
pub const DEFAULT_LINE_HEIGHT_MULTIPLIER: f32 = 1.2;

/// The baseline sits `font_size / BASELINE_OFFSET_DIVISOR` below the reference line
pub const BASELINE_OFFSET_DIVISOR: f32 = 3.0;

/// Supersampling factor applied when rasterizing the background page
pub const RASTER_SCALE: f32 = 2.0;

/// Smallest supersampling factor accepted
pub const MIN_RASTER_SCALE: f32 = 2.0;

/// JPEG quality (0-100) for the re-encoded background
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Filename used for downloads when the caller does not provide one
pub const DEFAULT_FILENAME: &str = "edge-template-filled.pdf";

/// Resource name of the overlay font in the output page
pub const FONT_RESOURCE_NAME: &str = "F1";

/// Resource name of the background image in the output page
pub const BACKGROUND_RESOURCE_NAME: &str = "Im0";
