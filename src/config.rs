//! Configuration types for screenshot-to-code generation.
//!
//! Everything a [`crate::generate::Generator`] needs lives in
//! [`GeneratorConfig`], built via its [`GeneratorConfigBuilder`]. Provider
//! credentials are part of the config rather than read from the process
//! environment at call time, so tests can substitute fake keys and local
//! endpoints. [`GeneratorConfig::from_env`] is the one place the environment
//! is consulted, and it is meant to be called once at process start.

use crate::backend::InferenceBackend;
use crate::error::GenerateError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Sampling temperature sent with every generation request.
pub const TEMPERATURE: f32 = 0.4;

/// Output length cap (tokens) sent with every generation request.
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Configuration for a [`crate::generate::Generator`].
///
/// # Example
/// ```rust
/// use shot2code::{GeneratorConfig, ProviderKind};
///
/// let config = GeneratorConfig::builder()
///     .provider(ProviderKind::Gemini)
///     .api_key("test-key")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// Which provider to call. Default: [`ProviderKind::Gemini`].
    pub provider: ProviderKind,

    /// API key / token for the provider. Required for Gemini and Anthropic,
    /// optional for Hugging Face.
    pub api_key: Option<String>,

    /// Model identifier. If None, uses [`ProviderKind::default_model`].
    pub model: Option<String>,

    /// Override for the provider's base URL (scheme + host, no trailing
    /// slash). If None, uses [`ProviderKind::default_base_url`].
    pub base_url: Option<String>,

    /// Pre-constructed backend. Takes precedence over `provider`.
    pub backend: Option<Arc<dyn InferenceBackend>>,

    /// Per-call timeout in seconds. Default: 60.
    ///
    /// A stalled provider connection would otherwise hang the caller
    /// indefinitely. There is no retry; the user resubmits.
    pub timeout_secs: u64,

    /// Optional observer for submit/complete/error events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: None,
            base_url: None,
            backend: None,
            timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from process environment variables.
    ///
    /// * `SHOT2CODE_PROVIDER`: `gemini`, `anthropic` or `huggingface`. When
    ///   unset, the first provider whose key variable is present wins, in the
    ///   order Gemini, Anthropic, Hugging Face.
    /// * `SHOT2CODE_MODEL`: model override.
    /// * `GEMINI_API_KEY`, `ANTHROPIC_API_KEY`, `HF_API_TOKEN`: credentials.
    pub fn from_env() -> Result<Self, GenerateError> {
        let provider = match non_empty_env("SHOT2CODE_PROVIDER") {
            Some(name) => name.parse()?,
            None => ProviderKind::ALL
                .into_iter()
                .find(|p| non_empty_env(p.key_env_var()).is_some())
                .unwrap_or_default(),
        };

        let mut builder = Self::builder().provider(provider);
        if let Some(key) = non_empty_env(provider.key_env_var()) {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty_env("SHOT2CODE_MODEL") {
            builder = builder.model(model);
        }
        builder.build()
    }

    /// The model that will be requested: the override or the provider default.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The base URL that will be called: the override or the provider default.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, GenerateError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(GenerateError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref url) = c.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GenerateError::InvalidConfig(format!(
                    "Base URL must start with http:// or https://, got '{}'",
                    url
                )));
            }
        }
        if matches!(c.model.as_deref(), Some(m) if m.trim().is_empty()) {
            return Err(GenerateError::InvalidConfig("Model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target output format for the generated code.
///
/// The first option, `Html`, is the default selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Plain markup: HTML with CSS in a `<style>` tag.
    #[default]
    Html,
    /// Utility-class markup: HTML styled with Tailwind CSS.
    Tailwind,
    /// Component framework: a React function component.
    React,
}

impl Framework {
    /// Every supported framework, in selection order.
    pub const ALL: [Framework; 3] = [Framework::Html, Framework::Tailwind, Framework::React];

    /// Wire name as accepted by the proxy endpoint and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Html => "html",
            Framework::Tailwind => "tailwind",
            Framework::React => "react",
        }
    }

    /// Conventional file extension for the generated code.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Framework::Html | Framework::Tailwind => "html",
            Framework::React => "jsx",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Framework::Html),
            "tailwind" => Ok(Framework::Tailwind),
            "react" => Ok(Framework::React),
            _ => Err(GenerateError::InvalidSelection {
                value: s.to_string(),
            }),
        }
    }
}

/// The external inference provider to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent`.
    #[default]
    Gemini,
    /// Anthropic Messages API.
    Anthropic,
    /// Hugging Face Inference API, image-to-text (captioning) models.
    HuggingFace,
}

impl ProviderKind {
    /// Every provider, in auto-detection order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::HuggingFace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::HuggingFace => "huggingface",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            ProviderKind::HuggingFace => "Salesforce/blip-image-captioning-large",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::HuggingFace => "https://api-inference.huggingface.co",
        }
    }

    /// Environment variable holding this provider's credential.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::HuggingFace => "HF_API_TOKEN",
        }
    }

    /// Whether a call is possible without a credential.
    pub fn requires_key(&self) -> bool {
        !matches!(self, ProviderKind::HuggingFace)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            other => Err(GenerateError::ProviderNotConfigured {
                provider: other.to_string(),
                hint: "Supported providers: gemini, anthropic, huggingface".into(),
            }),
        }
    }
}
