//! Try-on providers.

mod gemini;

pub use gemini::{GeminiModel, GeminiProvider, GeminiProviderBuilder, API_KEY_ENV_VARS};
