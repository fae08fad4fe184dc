//! Generation entry points.
//!
//! [`Generator`] is the orchestrator: it validates the framework selection,
//! builds the prompt, makes exactly one provider call and shapes the answer
//! into [`GeneratedCode`]. It holds no per-request state, so one generator
//! can be shared across tasks (the proxy server does this). For the
//! "one current result" behaviour of an interactive front end, wrap it in a
//! [`crate::session::GenerationSession`].

use crate::backend::{resolve_backend, InferenceBackend};
use crate::config::{Framework, GeneratorConfig};
use crate::error::{GenerateError, IntakeError};
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::{intake, llm};
use crate::progress::ProgressCallback;
use crate::prompts::build_prompt;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    /// The generated code, fences removed.
    pub code: String,
    /// Framework the code was generated for.
    pub framework: Framework,
    /// Name of the backend that produced it.
    pub backend: String,
    /// Id of the generation within its generator (starts at 1).
    pub request_id: u64,
    /// Wall-clock time of the provider call, in milliseconds.
    pub duration_ms: u64,
}

/// Orchestrates prompt → provider → cleaned code.
pub struct Generator {
    backend: Arc<dyn InferenceBackend>,
    timeout_secs: u64,
    progress: Option<ProgressCallback>,
    next_id: AtomicU64,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("backend", &self.backend.name())
            .field("timeout_secs", &self.timeout_secs)
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

impl Generator {
    /// Build a generator, resolving the backend from `config`.
    ///
    /// # Errors
    /// `ProviderNotConfigured` when the provider needs a key and none is set.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let backend = resolve_backend(config)?;
        Ok(Self {
            backend,
            timeout_secs: config.timeout_secs,
            progress: config.progress_callback.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate code for `image` in the framework named `framework`.
    ///
    /// `framework` is parsed first; an unknown value fails with
    /// `InvalidSelection` and no provider call is made.
    pub async fn generate(
        &self,
        image: &EncodedImage,
        framework: &str,
    ) -> Result<GeneratedCode, GenerateError> {
        let framework: Framework = framework.parse()?;
        self.generate_framework(image, framework).await
    }

    /// Generate code for `image` in an already-validated `framework`.
    pub async fn generate_framework(
        &self,
        image: &EncodedImage,
        framework: Framework,
    ) -> Result<GeneratedCode, GenerateError> {
        let request_id = self.next_request_id();
        self.run(request_id, image, framework).await
    }

    /// Reserve the next request id.
    pub(crate) fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// One generation attempt under a caller-chosen id.
    pub(crate) async fn run(
        &self,
        request_id: u64,
        image: &EncodedImage,
        framework: Framework,
    ) -> Result<GeneratedCode, GenerateError> {
        let result = self.attempt(request_id, image, framework).await;
        if let Some(ref cb) = self.progress {
            match &result {
                Ok(generated) => cb.on_complete(request_id, generated.code.len()),
                Err(e) => cb.on_error(request_id, &e.to_string()),
            }
        }
        result
    }

    async fn attempt(
        &self,
        request_id: u64,
        image: &EncodedImage,
        framework: Framework,
    ) -> Result<GeneratedCode, GenerateError> {
        if image.byte_len() == 0 {
            return Err(IntakeError::Empty.into());
        }

        let backend = self.backend.as_ref();
        let prompt = build_prompt(framework);
        info!(
            "Generation #{}: {} via {} ({} image, {} bytes)",
            request_id,
            framework,
            backend.name(),
            image.media_type(),
            image.byte_len()
        );
        if let Some(ref cb) = self.progress {
            cb.on_submit(request_id, framework, backend.name());
        }

        let start = Instant::now();
        let raw = llm::submit(backend, &prompt, image, self.timeout_secs).await?;
        let code = llm::shape_output(backend.output_kind(), framework, &raw)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Generation #{} complete: {} chars in {}ms",
            request_id,
            code.len(),
            duration_ms
        );

        Ok(GeneratedCode {
            code,
            framework,
            backend: backend.name().to_string(),
            request_id,
            duration_ms,
        })
    }
}

/// Read an image file and generate code for it in one call.
///
/// # Example
/// ```rust,no_run
/// use shot2code::{generate_file, GeneratorConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Provider and key from SHOT2CODE_PROVIDER / GEMINI_API_KEY / …
/// let config = GeneratorConfig::from_env()?;
/// let generated = generate_file("screenshot.png", "tailwind", &config).await?;
/// println!("{}", generated.code);
/// # Ok(())
/// # }
/// ```
pub async fn generate_file(
    path: impl AsRef<Path>,
    framework: &str,
    config: &GeneratorConfig,
) -> Result<GeneratedCode, GenerateError> {
    let framework: Framework = framework.parse()?;
    let generator = Generator::new(config)?;
    let image = intake::from_path(path).await?;
    generator.generate_framework(&image, framework).await
}

/// Synchronous wrapper around [`generate_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_file_sync(
    path: impl AsRef<Path>,
    framework: &str,
    config: &GeneratorConfig,
) -> Result<GeneratedCode, GenerateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GenerateError::transport(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate_file(path, framework, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OutputKind;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed result.
    struct ScriptedBackend {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        images: Mutex<Vec<EncodedImage>>,
        reply: Result<String, GenerateError>,
        kind: OutputKind,
    }

    impl ScriptedBackend {
        fn new(reply: Result<String, GenerateError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                images: Mutex::new(Vec::new()),
                reply,
                kind: OutputKind::Code,
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn output_kind(&self) -> OutputKind {
            self.kind
        }

        async fn submit(&self, prompt: &str, image: &EncodedImage) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.images.lock().unwrap().push(image.clone());
            self.reply.clone()
        }
    }

    fn generator_with(backend: Arc<ScriptedBackend>) -> Generator {
        let config = GeneratorConfig::builder()
            .backend(backend as Arc<dyn InferenceBackend>)
            .build()
            .unwrap();
        Generator::new(&config).unwrap()
    }

    fn jpeg() -> EncodedImage {
        intake::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']).unwrap()
    }

    #[tokio::test]
    async fn invalid_framework_makes_no_call() {
        let backend = ScriptedBackend::new(Ok("<p>x</p>".into()));
        let generator = generator_with(backend.clone());
        let err = generator.generate(&jpeg(), "angular").await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidSelection { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn html_prompt_and_image_reach_backend() {
        let backend = ScriptedBackend::new(Ok("```html\n<main></main>\n```".into()));
        let generator = generator_with(backend.clone());
        let image = jpeg();

        let generated = generator.generate(&image, "html").await.unwrap();
        assert_eq!(generated.code, "<main></main>");
        assert_eq!(generated.framework, Framework::Html);
        assert_eq!(generated.backend, "scripted");
        assert_eq!(generated.request_id, 1);

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(backend.prompts.lock().unwrap()[0].contains("HTML + CSS"));
        assert_eq!(backend.images.lock().unwrap()[0], image);
    }

    #[tokio::test]
    async fn provider_error_passes_through() {
        let backend = ScriptedBackend::new(Err(GenerateError::ProviderError {
            status: Some(400),
            message: "API key not valid".into(),
        }));
        let generator = generator_with(backend);
        match generator.generate(&jpeg(), "react").await {
            Err(GenerateError::ProviderError { message, .. }) => {
                assert_eq!(message, "API key not valid")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn whitespace_only_text_is_empty_result() {
        let backend = ScriptedBackend::new(Ok("   \n".into()));
        let generator = generator_with(backend);
        assert!(matches!(
            generator.generate(&jpeg(), "tailwind").await,
            Err(GenerateError::EmptyResult)
        ));
    }

    #[tokio::test]
    async fn request_ids_increase() {
        let backend = ScriptedBackend::new(Ok("<p/>".into()));
        let generator = generator_with(backend);
        let a = generator.generate(&jpeg(), "html").await.unwrap();
        let b = generator.generate(&jpeg(), "html").await.unwrap();
        assert!(b.request_id > a.request_id);
    }

    #[test]
    fn generate_framework_skips_parsing() {
        let backend = ScriptedBackend::new(Ok("<div class=\"p-4\"></div>".into()));
        let generator = generator_with(backend.clone());
        let generated = tokio_test::block_on(generator.generate_framework(&jpeg(), Framework::Tailwind));
        let generated = tokio_test::assert_ok!(generated);
        assert_eq!(generated.framework, Framework::Tailwind);
        assert!(backend.prompts.lock().unwrap()[0].contains("Use Tailwind utility classes"));
    }

    #[tokio::test]
    async fn empty_image_rejected_before_call() {
        let backend = ScriptedBackend::new(Ok("<p/>".into()));
        let generator = generator_with(backend.clone());
        let empty = EncodedImage::new("image/png", &[]);
        let err = generator.generate(&empty, "html").await.unwrap_err();
        assert!(matches!(err, GenerateError::Intake(IntakeError::Empty)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generate_file_rejects_framework_before_reading() {
        let config = GeneratorConfig::builder().api_key("k").build().unwrap();
        let err = generate_file("/no/such/file.png", "vue", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidSelection { .. }));
    }
}
