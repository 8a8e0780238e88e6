//! Try-on provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, ProviderKind, TryOnRequest};
use async_trait::async_trait;

/// A generative model that can render a person wearing a garment.
#[async_trait]
pub trait TryOnProvider: Send + Sync {
    /// Renders one image for the given request.
    async fn render(&self, request: &TryOnRequest) -> Result<GeneratedImage>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            ProviderKind::Gemini => "Gemini (Google)",
        }
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
