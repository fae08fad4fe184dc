//! Interactive generation state.
//!
//! A [`GenerationSession`] models one user's screen: a selected image, a
//! selected framework and exactly one displayed result. The result is either
//! the latest generated code or the latest error, never both.
//!
//! Overlapping submissions use cancel-and-replace semantics. Every
//! [`GenerationSession::generate`] call takes a fresh request id and becomes
//! the *current* request. When an older request finishes after a newer one
//! has started, its outcome is returned to its own caller as
//! [`GenerateError::Superseded`] and the displayed state is left untouched.

use crate::config::Framework;
use crate::error::{GenerateError, IntakeError};
use crate::generate::{GeneratedCode, Generator};
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::intake::ImageSlot;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// What the session currently displays.
#[derive(Debug, Clone, Default)]
pub enum GenerationState {
    /// Nothing generated yet.
    #[default]
    Idle,
    /// A request is in flight (the loading indicator).
    Submitting { request_id: u64 },
    /// The current request produced code.
    Succeeded(GeneratedCode),
    /// The current request failed; the message replaces any earlier code.
    Failed(GenerateError),
}

impl GenerationState {
    pub fn is_loading(&self) -> bool {
        matches!(self, GenerationState::Submitting { .. })
    }

    /// The displayed code, if the last request succeeded.
    pub fn code(&self) -> Option<&str> {
        match self {
            GenerationState::Succeeded(generated) => Some(&generated.code),
            _ => None,
        }
    }

    /// The displayed error, if the last request failed.
    pub fn error(&self) -> Option<&GenerateError> {
        match self {
            GenerationState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    current_id: u64,
    state: GenerationState,
}

/// One user's image selection, framework selection and displayed result.
#[derive(Debug)]
pub struct GenerationSession {
    generator: Arc<Generator>,
    image: ImageSlot,
    framework: Mutex<Framework>,
    inner: Mutex<Inner>,
}

impl GenerationSession {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self {
            generator,
            image: ImageSlot::new(),
            framework: Mutex::new(Framework::default()),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Snapshot of the displayed state.
    pub fn state(&self) -> GenerationState {
        self.lock_inner().state.clone()
    }

    /// The selected image, if any.
    pub fn image(&self) -> Option<EncodedImage> {
        self.image.current()
    }

    /// Replace the selected image with `bytes`.
    ///
    /// A rejected image clears the selection.
    pub fn set_image(&self, bytes: &[u8]) -> Result<EncodedImage, IntakeError> {
        self.image.set_image(bytes)
    }

    /// Replace the selected image with a file's contents.
    pub async fn set_image_from_path(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<EncodedImage, IntakeError> {
        self.image.set_image_from_path(path).await
    }

    /// The selected framework.
    pub fn framework(&self) -> Framework {
        *self
            .framework
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Change the selected framework. An unknown value leaves it unchanged.
    pub fn set_framework(&self, value: &str) -> Result<Framework, GenerateError> {
        let framework: Framework = value.parse()?;
        *self
            .framework
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = framework;
        Ok(framework)
    }

    /// Generate from the selected image and framework.
    pub async fn generate_current(&self) -> Result<GeneratedCode, GenerateError> {
        let framework = self.framework();
        let request_id = self.begin();
        let result = match self.image.current() {
            Some(image) => self.generator.run(request_id, &image, framework).await,
            None => Err(GenerateError::NoImage),
        };
        self.finish(request_id, result)
    }

    /// Generate from an explicit image and framework name.
    ///
    /// Becomes the current request; any request still in flight is
    /// superseded. An unknown `framework` fails without contacting the
    /// provider and is displayed like any other error.
    pub async fn generate(
        &self,
        image: &EncodedImage,
        framework: &str,
    ) -> Result<GeneratedCode, GenerateError> {
        let request_id = self.begin();
        let result = match framework.parse::<Framework>() {
            Ok(framework) => self.generator.run(request_id, image, framework).await,
            Err(e) => Err(e),
        };
        self.finish(request_id, result)
    }

    fn begin(&self) -> u64 {
        let request_id = self.generator.next_request_id();
        let mut inner = self.lock_inner();
        if let GenerationState::Submitting { request_id: old } = inner.state {
            debug!("Generation #{} superseded by #{}", old, request_id);
        }
        inner.current_id = request_id;
        inner.state = GenerationState::Submitting { request_id };
        request_id
    }

    fn finish(
        &self,
        request_id: u64,
        result: Result<GeneratedCode, GenerateError>,
    ) -> Result<GeneratedCode, GenerateError> {
        let mut inner = self.lock_inner();
        if inner.current_id != request_id {
            debug!("Discarding stale result of generation #{}", request_id);
            return Err(GenerateError::Superseded { request_id });
        }
        inner.state = match &result {
            Ok(generated) => GenerationState::Succeeded(generated.clone()),
            Err(e) => GenerationState::Failed(e.clone()),
        };
        result
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;
    use crate::config::GeneratorConfig;
    use crate::pipeline::intake;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes the prompt's framework label after a delay chosen per call.
    struct DelayedBackend {
        delays: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl InferenceBackend for DelayedBackend {
        fn name(&self) -> &str {
            "delayed"
        }

        async fn submit(&self, prompt: &str, _image: &EncodedImage) -> Result<String, GenerateError> {
            let delay = {
                let mut delays = self.delays.lock().unwrap();
                if delays.is_empty() {
                    0
                } else {
                    delays.remove(0)
                }
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if prompt.contains("React") {
                Ok("```jsx\nexport default function A() {}\n```".into())
            } else {
                Ok("```html\n<p>html</p>\n```".into())
            }
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl InferenceBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn submit(&self, _prompt: &str, _image: &EncodedImage) -> Result<String, GenerateError> {
            Err(GenerateError::ProviderError {
                status: Some(429),
                message: "quota exceeded".into(),
            })
        }
    }

    fn session_with(backend: Arc<dyn InferenceBackend>) -> GenerationSession {
        let config = GeneratorConfig::builder().backend(backend).build().unwrap();
        GenerationSession::new(Arc::new(Generator::new(&config).unwrap()))
    }

    fn png() -> EncodedImage {
        intake::from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap()
    }

    #[tokio::test]
    async fn starts_idle() {
        let session = session_with(Arc::new(FailingBackend));
        assert!(matches!(session.state(), GenerationState::Idle));
        assert_eq!(session.framework(), Framework::Html);
    }

    #[tokio::test]
    async fn success_is_displayed() {
        let session = session_with(Arc::new(DelayedBackend {
            delays: Mutex::new(vec![]),
        }));
        let generated = session.generate(&png(), "html").await.unwrap();
        assert_eq!(generated.code, "<p>html</p>");
        assert_eq!(session.state().code(), Some("<p>html</p>"));
    }

    #[tokio::test]
    async fn error_replaces_code() {
        let session = session_with(Arc::new(FailingBackend));
        let err = session.generate(&png(), "react").await.unwrap_err();
        assert_eq!(err.to_string(), "Provider error: quota exceeded");
        let state = session.state();
        assert!(state.code().is_none());
        assert_eq!(
            state.error().map(|e| e.to_string()).as_deref(),
            Some("Provider error: quota exceeded")
        );
    }

    #[tokio::test]
    async fn invalid_framework_is_displayed() {
        let session = session_with(Arc::new(FailingBackend));
        let err = session.generate(&png(), "svelte").await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidSelection { .. }));
        assert!(matches!(
            session.state().error(),
            Some(GenerateError::InvalidSelection { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn late_stale_response_is_discarded() {
        // First request answers after the second one.
        let session = Arc::new(session_with(Arc::new(DelayedBackend {
            delays: Mutex::new(vec![500, 10]),
        })));
        let image = png();

        let first = {
            let session = Arc::clone(&session);
            let image = image.clone();
            tokio::spawn(async move { session.generate(&image, "html").await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(session.state().is_loading());

        let second = session.generate(&image, "react").await.unwrap();
        assert_eq!(second.framework, Framework::React);

        let first = first.await.unwrap();
        assert!(matches!(first, Err(GenerateError::Superseded { .. })));

        let state = session.state();
        assert_eq!(state.code(), Some("export default function A() {}"));
    }

    #[tokio::test]
    async fn generate_current_without_image() {
        let session = session_with(Arc::new(FailingBackend));
        let err = session.generate_current().await.unwrap_err();
        assert!(matches!(err, GenerateError::NoImage));
        assert_eq!(err.to_string(), "Please upload an image first");
    }

    #[tokio::test]
    async fn generate_current_uses_selection() {
        let session = session_with(Arc::new(DelayedBackend {
            delays: Mutex::new(vec![]),
        }));
        session.set_image(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        session.set_framework("React").unwrap();
        let generated = session.generate_current().await.unwrap();
        assert_eq!(generated.framework, Framework::React);
        assert_eq!(generated.code, "export default function A() {}");
    }

    #[test]
    fn bad_framework_selection_keeps_previous() {
        let session = session_with(Arc::new(FailingBackend));
        session.set_framework("tailwind").unwrap();
        assert!(session.set_framework("vue").is_err());
        assert_eq!(session.framework(), Framework::Tailwind);
    }
}
