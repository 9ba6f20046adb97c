//! Error types for the lopdf-overlay library

use thiserror::Error;

/// Result type alias using OverlayError
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur while loading templates or rendering an overlay
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The source document could not be parsed
    #[error("Failed to decode source document: {0}")]
    DocumentDecode(String),

    /// The source document parsed but has no pages
    #[error("Source document has no pages")]
    EmptyDocument,

    /// The rasterization surface could not be allocated or came back empty
    #[error("Failed to allocate render surface: {0}")]
    RenderSurface(String),

    /// The rasterization backend could not be loaded
    #[error("Rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    /// The template layout failed validation
    #[error("Invalid template layout: {0}")]
    InvalidLayout(String),

    /// Field values were not supplied as a JSON object
    #[error("Invalid field values: {0}")]
    InvalidValues(String),

    /// The background bitmap could not be re-encoded
    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    /// Error from the underlying lopdf library
    #[error("PDF operation failed: {0}")]
    PdfError(#[from] lopdf::Error),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
