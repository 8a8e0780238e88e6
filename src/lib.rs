#![warn(missing_docs)]
//! Tryon - virtual try-on with generative image models.
//!
//! Upload a photo of a person and a photo of a garment, and get back
//! photorealistic renders of the person wearing the garment.
//!
//! # Quick Start
//!
//! ```no_run
//! use tryon::{GeminiProvider, ImageUpload, TryOnOptions, TryOnSession};
//!
//! #[tokio::main]
//! async fn main() -> tryon::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!
//!     let mut session = TryOnSession::new();
//!     session.select_person(ImageUpload::from_path("me.jpg").await?);
//!     session.select_garment(ImageUpload::from_path("jacket.png").await?);
//!     session.options = TryOnOptions::new().with_count(3).with_instructions("add a hat");
//!
//!     session.generate(&provider).await?;
//!     session.download_all("results")?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `tryon` command-line tool.

mod error;

pub mod gallery;
pub mod generate;
pub mod image;
pub mod options;
pub mod prompt;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, TryOnError};

pub use gallery::{GalleryItem, GalleryView};
pub use generate::{generate_try_on_images, generate_with_progress, Progress};
pub use image::providers::{
    GeminiModel, GeminiProvider, GeminiProviderBuilder, API_KEY_ENV_VARS,
};
pub use image::{
    AspectRatio, GeneratedImage, GenerationMetadata, ImageFormat, ImageUpload, InlineImage,
    ProviderKind, TryOnProvider, TryOnRequest,
};
pub use options::{TryOnOptions, MAX_COUNT};
pub use prompt::compose_prompt;
pub use session::TryOnSession;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, TryOnError};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{GeneratedImage, ImageUpload, TryOnProvider};
    pub use crate::options::TryOnOptions;
    pub use crate::session::TryOnSession;
}
