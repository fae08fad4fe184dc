//! Anthropic Messages API backend (`/v1/messages`).
//!
//! The screenshot goes first as a base64 `image` block, then the prompt as a
//! `text` block, in a single user turn. Authentication uses the `x-api-key`
//! header plus the pinned `anthropic-version`.

use super::http::{self, Reply};
use super::{InferenceBackend, OutputKind};
use crate::config::{MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::error::GenerateError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Calls Anthropic's Messages API.
pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl AnthropicBackend {
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
}

fn request_body<'a>(model: &'a str, prompt: &'a str, image: &'a EncodedImage) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: MAX_OUTPUT_TOKENS,
        temperature: TEMPERATURE,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: image.media_type(),
                        data: image.base64(),
                    },
                },
                ContentBlock::Text { text: prompt },
            ],
        }],
    }
}

fn parse_reply(reply: &Reply) -> Result<String, GenerateError> {
    let response: MessagesResponse = http::decode_reply(reply)?;
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyResult);
    }
    Ok(text)
}

#[async_trait]
impl InferenceBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Code
    }

    async fn submit(&self, prompt: &str, image: &EncodedImage) -> Result<String, GenerateError> {
        debug!("Anthropic: POST /v1/messages model={}", self.model);
        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body(&self.model, prompt, image));
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
        let image = EncodedImage::new("image/png", b"\x89PNG");
        let body = serde_json::to_value(request_body("claude-x", "prompt", &image)).unwrap();
        assert_eq!(body["model"], "claude-x");
        assert_eq!(body["max_tokens"], 8192);
        let content = &body["messages"][0]["content"];
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[0]["source"]["data"], image.base64());
        assert_eq!(content[1], json!({"type": "text", "text": "prompt"}));
    }

    #[test]
    fn joins_text_blocks() {
        let r = reply(
            200,
            json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "```html\n<p>"},
                    {"type": "text", "text": "hi</p>\n```"}
                ],
                "stop_reason": "end_turn"
            }),
        );
        assert_eq!(parse_reply(&r).unwrap(), "```html\n<p>hi</p>\n```");
    }

    #[test]
    fn no_text_blocks_is_empty_result() {
        let r = reply(200, json!({"type": "message", "content": []}));
        assert!(matches!(parse_reply(&r), Err(GenerateError::EmptyResult)));
    }

    #[test]
    fn error_envelope_is_provider_error() {
        let r = reply(
            401,
            json!({"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
        );
        match parse_reply(&r) {
            Err(GenerateError::ProviderError { status, message }) => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
