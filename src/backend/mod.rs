//! Inference backends: the external services that turn an image + prompt
//! into text.
//!
//! Each provider is one implementation of [`InferenceBackend`]. The rest of
//! the crate only ever holds an `Arc<dyn InferenceBackend>`, so switching
//! provider is a configuration change and tests can inject a fake.
//!
//! | Backend | Output | Auth |
//! |---------|--------|------|
//! | [`GeminiBackend`] | code | `?key=` query parameter |
//! | [`AnthropicBackend`] | code | `x-api-key` header |
//! | [`HuggingFaceBackend`] | caption | optional bearer token |

pub mod anthropic;
pub mod gemini;
pub(crate) mod http;
pub mod huggingface;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use huggingface::HuggingFaceBackend;

use crate::config::{GeneratorConfig, ProviderKind};
use crate::error::GenerateError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// What a backend's text output is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Source code, possibly wrapped in a fence pair.
    Code,
    /// A natural-language description of the image.
    Caption,
}

/// An external multimodal service exposing `submit(prompt, image) -> text`.
///
/// Implementations issue exactly one request per call and do not retry.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short provider name used in logs and results.
    fn name(&self) -> &str;

    /// Whether the returned text is code or a caption.
    fn output_kind(&self) -> OutputKind {
        OutputKind::Code
    }

    /// Send the prompt and image, returning the provider's text output.
    async fn submit(&self, prompt: &str, image: &EncodedImage) -> Result<String, GenerateError>;
}

/// Resolve the backend for a config.
///
/// A pre-built `config.backend` wins; otherwise one is constructed for
/// `config.provider` from the config's key, model and base URL.
pub fn resolve_backend(config: &GeneratorConfig) -> Result<Arc<dyn InferenceBackend>, GenerateError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let provider = config.provider;
    let key = config.api_key.clone().filter(|k| !k.trim().is_empty());
    if provider.requires_key() && key.is_none() {
        return Err(GenerateError::ProviderNotConfigured {
            provider: provider.to_string(),
            hint: format!(
                "Set {} or pass --api-key.",
                provider.key_env_var()
            ),
        });
    }

    let client = http::build_client()?;
    let base_url = config.effective_base_url().to_string();
    let model = config.effective_model().to_string();
    info!("Using provider {} with model {}", provider, model);

    let backend: Arc<dyn InferenceBackend> = match provider {
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(
            client,
            base_url,
            model,
            key.unwrap_or_default(),
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(
            client,
            base_url,
            model,
            key.unwrap_or_default(),
        )),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceBackend::new(client, base_url, model, key)),
    };
    Ok(backend)
}
