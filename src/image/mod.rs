//! Image intake, types and providers.

pub mod intake;
mod provider;
pub mod providers;
mod types;

pub use intake::{ImageUpload, InlineImage};
pub use provider::TryOnProvider;
pub use types::{
    download_name, AspectRatio, GeneratedImage, GenerationMetadata, ImageFormat, ProviderKind,
    TryOnRequest,
};
