//! Image intake: turns user-selected files into previews and API payloads.

use crate::error::{Result, TryOnError};
use crate::image::types::ImageFormat;
use base64::Engine;
use std::path::Path;

/// Base64 payload plus MIME type, the shape the generation API expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Standard base64 of the image bytes.
    pub data: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl InlineImage {
    /// Encodes raw image bytes, detecting the format from magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(bytes).ok_or_else(|| {
            TryOnError::UnsupportedFormat("expected a PNG, JPEG or WebP image".into())
        })?;
        Ok(Self::encode(bytes, format))
    }

    /// Encodes raw bytes as the given format without sniffing them.
    pub fn encode(bytes: &[u8], format: ImageFormat) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: format.mime_type().to_string(),
        }
    }

    /// Splits a `data:<mime>;base64,<payload>` URL into MIME type and payload.
    ///
    /// Whitespace inside the payload is dropped and missing padding is
    /// tolerated; the payload is re-encoded in canonical form.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| TryOnError::Decode("not a data URL".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| TryOnError::Decode("data URL is not base64-encoded".into()))?;

        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| TryOnError::UnsupportedFormat(mime_type.to_string()))?;
        let bytes = decode_base64_lenient(payload)?;
        if bytes.is_empty() {
            return Err(TryOnError::InvalidRequest("data URL has no image data".into()));
        }

        Ok(Self::encode(&bytes, format))
    }

    /// Decodes the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_base64_lenient(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A user-selected image: file name, detected format, preview and payload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    name: String,
    format: ImageFormat,
    size: usize,
    inline: InlineImage,
}

impl ImageUpload {
    /// Reads an image file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read upload");
        Self::from_bytes(name, &bytes)
    }

    /// Builds an upload from in-memory bytes.
    ///
    /// The format comes from the magic bytes; the file extension is only
    /// consulted when the bytes are not recognised.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(TryOnError::InvalidRequest(format!("{name} is empty")));
        }

        let format = ImageFormat::from_magic_bytes(bytes)
            .or_else(|| {
                Path::new(&name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                TryOnError::UnsupportedFormat(format!("{name}: expected PNG, JPG or WEBP"))
            })?;

        Ok(Self {
            inline: InlineImage::encode(bytes, format),
            size: bytes.len(),
            format,
            name,
        })
    }

    /// File name the image was selected under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detected image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size of the original file in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Data URL suitable for showing a preview.
    pub fn preview(&self) -> String {
        self.inline.to_data_url()
    }

    /// Payload sent to the generation API.
    pub fn inline(&self) -> &InlineImage {
        &self.inline
    }
}

/// Decodes base64 that may carry whitespace or lack padding.
fn decode_base64_lenient(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(cleaned.trim_end_matches('='))
        .map_err(|e| TryOnError::Decode(e.to_string()))
}
