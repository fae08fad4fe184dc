//! Provider interaction: send one prompt + image and shape the answer.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`], wire formats live in [`crate::backend`]; what remains
//! here is the per-call deadline and turning the raw provider text into the
//! code the caller sees.
//!
//! ## No retries
//!
//! Exactly one request is issued per call. A failed attempt is reported to
//! the user, who can resubmit; nothing here sleeps or loops.

use crate::backend::{InferenceBackend, OutputKind};
use crate::config::Framework;
use crate::error::GenerateError;
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::postprocess;
use crate::scaffold;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Submit `prompt` and `image` to `backend`, bounded by `timeout_secs`.
///
/// Returns the backend's raw text.
pub async fn submit(
    backend: &dyn InferenceBackend,
    prompt: &str,
    image: &EncodedImage,
    timeout_secs: u64,
) -> Result<String, GenerateError> {
    let start = Instant::now();
    let deadline = Duration::from_secs(timeout_secs);

    let result = match timeout(deadline, backend.submit(prompt, image)).await {
        Ok(result) => result,
        Err(_) => Err(GenerateError::Timeout { secs: timeout_secs }),
    };

    match &result {
        Ok(text) => debug!(
            "{}: {} chars in {:?}",
            backend.name(),
            text.len(),
            start.elapsed()
        ),
        Err(e) => warn!("{}: call failed after {:?}: {}", backend.name(), start.elapsed(), e),
    }
    result
}

/// Turn raw backend output into the code returned to the caller.
///
/// Code output loses its outer fence pair; caption output is wrapped in a
/// starter snippet for `framework`. Empty results are rejected either way.
pub fn shape_output(
    kind: OutputKind,
    framework: Framework,
    raw: &str,
) -> Result<String, GenerateError> {
    let code = match kind {
        OutputKind::Code => postprocess::clean_code(raw),
        OutputKind::Caption => {
            let caption = raw.trim();
            if caption.is_empty() {
                return Err(GenerateError::EmptyResult);
            }
            scaffold::render(framework, caption)
        }
    };
    if code.trim().is_empty() {
        return Err(GenerateError::EmptyResult);
    }
    Ok(code)
}
