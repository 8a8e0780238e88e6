//! User-selected generation options.

use crate::error::{Result, TryOnError};
use crate::image::AspectRatio;
use serde::{Deserialize, Serialize};

/// Hard limit on images per generation.
pub const MAX_COUNT: u32 = 10;

/// Number of images, aspect ratio and free-text instructions for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnOptions {
    /// How many independent renders to request.
    pub count: u32,
    /// Aspect ratio every render must have.
    pub aspect_ratio: AspectRatio,
    /// Extra styling instructions, e.g. "add a hat".
    pub instructions: String,
    /// Save every result as soon as a run succeeds.
    pub auto_download: bool,
}

impl Default for TryOnOptions {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            aspect_ratio: AspectRatio::default(),
            instructions: String::new(),
            auto_download: false,
        }
    }
}

impl TryOnOptions {
    /// Image counts offered as quick choices.
    pub const COUNT_CHOICES: [u32; 3] = [1, 3, 5];

    /// Count used when none is chosen.
    pub const DEFAULT_COUNT: u32 = 5;

    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of images.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the free-text instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Enables or disables saving results right after generation.
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    /// Checks the count is within `1..=MAX_COUNT`.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(TryOnError::InvalidRequest(
                "count must be at least 1".into(),
            ));
        }
        if self.count > MAX_COUNT {
            return Err(TryOnError::InvalidRequest(format!(
                "count must be at most {MAX_COUNT}, got {}",
                self.count
            )));
        }
        Ok(())
    }

    /// Label for the generate action, e.g. "Generate 3 Images".
    pub fn generate_label(&self) -> String {
        let plural = if self.count > 1 { "s" } else { "" };
        format!("Generate {} Image{plural}", self.count)
    }

    /// Restores every option to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TryOnOptions::default();
        assert_eq!(options.count, 5);
        assert_eq!(options.aspect_ratio, AspectRatio::Portrait);
        assert!(options.instructions.is_empty());
        assert!(!options.auto_download);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_count_bounds() {
        assert!(TryOnOptions::new().with_count(0).validate().is_err());
        assert!(TryOnOptions::new().with_count(1).validate().is_ok());
        assert!(TryOnOptions::new().with_count(MAX_COUNT).validate().is_ok());
        assert!(TryOnOptions::new()
            .with_count(MAX_COUNT + 1)
            .validate()
            .is_err());
        for count in TryOnOptions::COUNT_CHOICES {
            assert!(TryOnOptions::new().with_count(count).validate().is_ok());
        }
    }

    #[test]
    fn test_generate_label() {
        assert_eq!(TryOnOptions::new().with_count(1).generate_label(), "Generate 1 Image");
        assert_eq!(TryOnOptions::new().generate_label(), "Generate 5 Images");
    }

    #[test]
    fn test_reset() {
        let mut options = TryOnOptions::new()
            .with_count(1)
            .with_aspect_ratio(AspectRatio::Landscape)
            .with_instructions("add a hat")
            .with_auto_download(true);
        options.reset();
        assert_eq!(options, TryOnOptions::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: TryOnOptions =
            serde_json::from_str(r#"{"count": 3, "aspect_ratio": "1:1"}"#).unwrap();
        assert_eq!(options.count, 3);
        assert_eq!(options.aspect_ratio, AspectRatio::Square);
        assert!(options.instructions.is_empty());
    }
}
