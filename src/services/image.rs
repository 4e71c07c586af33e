//! Image Payload
//!
//! In-memory base64 representation of the photograph under analysis.

use std::fmt;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::error::{AppError, AppResult};

/// MIME type assumed when neither the bytes nor the file name say otherwise
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Encoded image, owned by the state controller
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64 data without a data-URL prefix
    pub data: String,
}

impl ImagePayload {
    /// Encode raw file bytes.
    ///
    /// The format is sniffed from magic bytes, then from the extension of
    /// `path_hint`. Pixels are never decoded.
    pub fn from_bytes(bytes: &[u8], path_hint: Option<&Path>) -> Self {
        let mime_type = sniff_mime_type(bytes)
            .or_else(|| path_hint.and_then(mime_from_extension))
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        Self {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Read and encode an image file
    pub async fn from_file(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(path.display().to_string())
            } else {
                AppError::Io(e)
            }
        })?;

        if bytes.is_empty() {
            return Err(AppError::validation(format!(
                "{} is empty",
                path.display()
            )));
        }

        let payload = Self::from_bytes(&bytes, Some(path));
        debug!(
            path = %path.display(),
            mime_type = %payload.mime_type,
            bytes = bytes.len(),
            "image loaded"
        );
        Ok(payload)
    }

    /// Accept a `data:<mime>;base64,<data>` URL or bare base64.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::validation("image data is empty"));
        }

        let (header, data) = match raw.split_once(',') {
            Some((header, data)) => (Some(header), data),
            None => (None, raw),
        };

        let mime_type = header
            .and_then(|h| h.strip_prefix("data:"))
            .and_then(|h| h.split(';').next())
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        if data.is_empty() {
            return Err(AppError::validation("image data is empty"));
        }

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Approximate decoded size in bytes
    pub fn byte_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.byte_len())
            .finish()
    }
}

fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
}
