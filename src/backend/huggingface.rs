//! Hugging Face Inference API backend for image-to-text models.
//!
//! The default model (BLIP large) is a captioner: it describes the screenshot
//! rather than writing code, and it takes no instruction text. The backend
//! therefore reports [`OutputKind::Caption`], and the generator turns the
//! caption into a starter snippet via [`crate::scaffold`].

use super::http::{self, Reply};
use super::{InferenceBackend, OutputKind};
use crate::error::GenerateError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct CaptionRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default)]
    generated_text: Option<String>,
}

/// The API returns a list for most pipelines and a bare object for a few.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaptionResponse {
    List(Vec<Caption>),
    Single(Caption),
}

/// Calls a Hugging Face hosted image-to-text model.
pub struct HuggingFaceBackend {
    client: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl HuggingFaceBackend {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_token,
        }
    }
}

fn parse_reply(reply: &Reply) -> Result<String, GenerateError> {
    let response: CaptionResponse = http::decode_reply(reply)?;
    let first = match response {
        CaptionResponse::List(items) => items.into_iter().next(),
        CaptionResponse::Single(item) => Some(item),
    };
    first
        .and_then(|c| c.generated_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(GenerateError::EmptyResult)
}

#[async_trait]
impl InferenceBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Caption
    }

    async fn submit(&self, _prompt: &str, image: &EncodedImage) -> Result<String, GenerateError> {
        debug!("HuggingFace: POST models/{} (captioning, prompt unused)", self.model);
        let mut request = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .json(&CaptionRequest {
                inputs: image.base64(),
            });
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }
        let reply = http::send(request).await?;
        parse_reply(&reply)
    }
}
