//! Google Gemini backend (`models/{model}:generateContent`).
//!
//! Request: one `contents` entry whose `parts` are the prompt text followed by
//! the screenshot as `inline_data`. The key travels as the `key` query
//! parameter. Success text lives at `candidates[0].content.parts[0].text`.

use super::http::{self, Reply};
use super::{InferenceBackend, OutputKind};
use crate::config::{MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::error::GenerateError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Calls Gemini's `generateContent` endpoint.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> Result<Url, GenerateError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        Url::parse_with_params(&url, &[("key", self.api_key.as_str())])
            .map_err(|e| GenerateError::InvalidConfig(format!("Bad Gemini URL '{url}': {e}")))
    }
}

fn request_body<'a>(prompt: &'a str, image: &'a EncodedImage) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.media_type(),
                        data: image.base64(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    }
}

fn parse_reply(reply: &Reply) -> Result<String, GenerateError> {
    let response: GeminiResponse = http::decode_reply(reply)?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerateError::EmptyResult)
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Code
    }

    async fn submit(&self, prompt: &str, image: &EncodedImage) -> Result<String, GenerateError> {
        debug!("Gemini: POST models/{}:generateContent", self.model);
        let request = self
            .client
            .post(self.endpoint()?)
            .json(&request_body(prompt, image));
        let reply = http::send(request).await?;
        parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    fn reply(status: u16, body: Value) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[test]
    fn request_body_shape() {
        let image = EncodedImage::new("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]);
        let body = serde_json::to_value(request_body("make html", &image)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "make html");
        assert_eq!(
            body["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/jpeg"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "/9j/4A==");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn endpoint_carries_key_and_model() {
        let backend = GeminiBackend::new(Client::new(), "http://127.0.0.1:1/", "gemini-x", "k&y");
        let url = backend.endpoint().unwrap();
        assert_eq!(url.path(), "/v1beta/models/gemini-x:generateContent");
        assert_eq!(url.query(), Some("key=k%26y"));
    }

    #[test]
    fn parses_candidate_text() {
        let r = reply(
            200,
            json!({"candidates":[{"content":{"parts":[{"text":"<div></div>"}],"role":"model"}}]}),
        );
        assert_eq!(parse_reply(&r).unwrap(), "<div></div>");
    }

    #[test]
    fn empty_text_is_empty_result() {
        let r = reply(200, json!({"candidates":[{"content":{"parts":[{"text":""}]}}]}));
        assert!(matches!(parse_reply(&r), Err(GenerateError::EmptyResult)));
    }

    #[test]
    fn missing_candidates_is_empty_result() {
        let r = reply(200, json!({"promptFeedback":{"blockReason":"SAFETY"}}));
        assert!(matches!(parse_reply(&r), Err(GenerateError::EmptyResult)));
    }

    #[test]
    fn error_envelope_is_provider_error() {
        let r = reply(
            400,
            json!({"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}),
        );
        match parse_reply(&r) {
            Err(GenerateError::ProviderError { status, message }) => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
