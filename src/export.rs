//! Packaging rendered documents for download or webhook delivery

use crate::constants::DEFAULT_FILENAME;
use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A rendered PDF and the filename it should be delivered under
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportedPdf {
    /// Wrap rendered bytes; a missing or blank filename uses the default
    pub fn new(filename: Option<&str>, bytes: Vec<u8>) -> Self {
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        Self { filename, bytes }
    }

    /// Base64 of the document, i.e. the payload after the data URI's comma
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:application/pdf;filename=<name>;base64,<payload>`
    ///
    /// The filename is percent-encoded so that `,` and `;` stay out of the
    /// header.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:application/pdf;filename={};base64,{}",
            urlencoding::encode(&self.filename),
            self.to_base64()
        )
    }

    /// JSON body for an automation webhook
    pub fn webhook_payload(
        &self,
        template_id: Option<&str>,
        drawing_id: Option<&str>,
    ) -> WebhookPayload {
        WebhookPayload {
            filename: self.filename.clone(),
            template_id: template_id.map(str::to_string),
            drawing_id: drawing_id.map(str::to_string),
            pdf_base64: self.to_base64(),
        }
    }

    /// Write the document into `dir` under its filename
    ///
    /// Only the final path component of the filename is used.
    #[instrument(skip(self, dir), fields(filename = %self.filename))]
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILENAME.into());
        let path = dir.as_ref().join(name);
        std::fs::write(&path, &self.bytes)?;
        debug!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

/// Body posted to a workflow-automation webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing_id: Option<String>,
    pub pdf_base64: String,
}

/// Extract the base64 payload of a data URI
pub fn data_uri_payload(uri: &str) -> Option<&str> {
    let (header, payload) = uri.split_once(',')?;
    header.ends_with(";base64").then_some(payload)
}
