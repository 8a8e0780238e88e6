//! Core types for try-on generation.

use crate::error::{Result, TryOnError};
use crate::image::intake::InlineImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Parses a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Image provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini image models.
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// Aspect ratios offered for try-on results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 9:16 portrait (tall) aspect ratio.
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square aspect ratio.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// All ratios, in the order they are offered.
    pub const ALL: [AspectRatio; 3] = [Self::Portrait, Self::Square, Self::Landscape];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "9:16",
            Self::Square => "1:1",
            Self::Landscape => "16:9",
        }
    }

    /// Returns the ratio in CSS `aspect-ratio` notation (e.g., "9 / 16").
    pub fn css_ratio(&self) -> &'static str {
        match self {
            Self::Portrait => "9 / 16",
            Self::Square => "1 / 1",
            Self::Landscape => "16 / 9",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| {
                TryOnError::InvalidRequest(format!(
                    "unsupported aspect ratio '{s}' (expected one of 9:16, 1:1, 16:9)"
                ))
            })
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Text the model returned alongside the image, if any.
    pub text: Option<String>,
}

/// One try-on render: the two input images plus the composed instruction.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    /// Photo of the person (sent first).
    pub person: InlineImage,
    /// Photo of the garment (sent second).
    pub garment: InlineImage,
    /// Natural-language instruction for the model.
    pub prompt: String,
    /// Requested output aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl TryOnRequest {
    /// Creates a request from already-encoded images.
    pub fn new(
        person: InlineImage,
        garment: InlineImage,
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
    ) -> Self {
        Self {
            person,
            garment,
            prompt: prompt.into(),
            aspect_ratio,
        }
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or displayed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Provider that generated this image.
    pub provider: ProviderKind,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        data: Vec<u8>,
        format: ImageFormat,
        provider: ProviderKind,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            data,
            format,
            provider,
            metadata,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            self.to_base64()
        )
    }

    /// File name offered when downloading the image at `index` (0-based).
    pub fn download_name(&self, index: usize) -> String {
        download_name(index, self.format)
    }

    /// Saves the image into `dir` under its download name.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>, index: usize) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.download_name(index));
        self.save(&path)?;
        Ok(path)
    }
}

/// `virtual-try-on-<n>.<ext>`, numbered from 1.
pub fn download_name(index: usize, format: ImageFormat) -> String {
    format!("virtual-try-on-{}.{}", index + 1, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a......"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_format_from_extension_and_mime() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(
            ImageFormat::from_mime_type("image/webp"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("1:1".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!(" 16:9 ".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert!("4:3".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::default(), AspectRatio::Portrait);
    }

    #[test]
    fn test_aspect_ratio_serde_uses_ratio_strings() {
        let json = serde_json::to_string(&AspectRatio::Landscape).unwrap();
        assert_eq!(json, r#""16:9""#);
        let parsed: AspectRatio = serde_json::from_str(r#""1:1""#).unwrap();
        assert_eq!(parsed, AspectRatio::Square);
    }

    #[test]
    fn test_download_name_is_one_based() {
        let image = GeneratedImage::new(
            PNG_MAGIC.to_vec(),
            ImageFormat::Png,
            ProviderKind::Gemini,
            GenerationMetadata::default(),
        );
        assert_eq!(image.download_name(0), "virtual-try-on-1.png");
        assert_eq!(download_name(4, ImageFormat::Jpeg), "virtual-try-on-5.jpg");
    }

    #[test]
    fn test_data_url() {
        let image = GeneratedImage::new(
            vec![1, 2, 3],
            ImageFormat::Jpeg,
            ProviderKind::Gemini,
            GenerationMetadata::default(),
        );
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,AQID");
    }
}
