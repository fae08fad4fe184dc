//! Shared HTTP plumbing for the provider backends.
//!
//! Every provider speaks JSON over HTTPS POST and reports failures with some
//! flavour of `{"error": …}` envelope. This module owns the parts they have
//! in common: the client, sending a request and collecting the raw reply,
//! and classifying a reply into text / provider error / transport error.

use crate::error::GenerateError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Fallback message when a provider sends an error envelope with no text.
const GENERIC_PROVIDER_ERROR: &str = "Failed to generate code";

/// Build the HTTP client shared by a backend.
///
/// Only the connect phase is bounded here; the overall per-call deadline is
/// applied by [`crate::pipeline::llm`] so every backend reports it the same
/// way.
pub fn build_client() -> Result<Client, GenerateError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("shot2code/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(GenerateError::transport)
}

/// A raw provider reply.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Send a request and read the full body.
pub(crate) async fn send(request: RequestBuilder) -> Result<Reply, GenerateError> {
    let response = request.send().await.map_err(GenerateError::transport)?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(GenerateError::transport)?
        .to_vec();
    debug!("Provider replied HTTP {} with {} bytes", status, body.len());
    Ok(Reply { status, body })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Gemini and Anthropic nest an object with a `message`; Hugging Face sends
/// a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Text(String),
    Detailed {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Extract the provider's error message, if the body is an error envelope.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    let message = match envelope.error {
        ErrorBody::Text(text) => text,
        ErrorBody::Detailed { message } => message.unwrap_or_default(),
    };
    if message.trim().is_empty() {
        Some(GENERIC_PROVIDER_ERROR.to_string())
    } else {
        Some(message)
    }
}

/// Classify a reply and, on success, decode its JSON body as `T`.
///
/// * error envelope (any status)            → `ProviderError`
/// * non-2xx without an envelope            → `TransportError`
/// * 2xx whose body does not decode as `T`  → `TransportError`
pub(crate) fn decode_reply<T>(reply: &Reply) -> Result<T, GenerateError>
where
    T: for<'de> Deserialize<'de>,
{
    if let Some(message) = error_message(&reply.body) {
        return Err(GenerateError::ProviderError {
            status: Some(reply.status.as_u16()),
            message,
        });
    }
    if !reply.status.is_success() {
        return Err(GenerateError::TransportError {
            detail: format!("HTTP {}: {}", reply.status, snippet(&reply.body)),
        });
    }
    serde_json::from_slice(&reply.body).map_err(|e| GenerateError::TransportError {
        detail: format!("undecodable response body: {e}"),
    })
}

/// First 200 characters of a body, for error messages.
fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "<empty body>".to_string();
    }
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}\u{2026}", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn reply(status: u16, body: &str) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn nested_error_message() {
        let body = br#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("API key not valid"));
    }

    #[test]
    fn string_error_message() {
        let body = br#"{"error":"Model is currently loading","estimated_time":20.0}"#;
        assert_eq!(error_message(body).as_deref(), Some("Model is currently loading"));
    }

    #[test]
    fn empty_error_message_gets_fallback() {
        assert_eq!(
            error_message(br#"{"error":{}}"#).as_deref(),
            Some(GENERIC_PROVIDER_ERROR)
        );
    }

    #[test]
    fn success_body_is_not_an_error() {
        assert!(error_message(br#"{"candidates":[]}"#).is_none());
        assert!(error_message(br#"[{"generated_text":"a"}]"#).is_none());
        assert!(error_message(b"<html>502</html>").is_none());
    }

    #[test]
    fn envelope_on_non_2xx_is_provider_error() {
        let r = reply(429, r#"{"error":{"message":"quota"}}"#);
        match decode_reply::<Value>(&r) {
            Err(GenerateError::ProviderError { status, message }) => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "quota");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_2xx_without_envelope_is_transport_error() {
        let r = reply(502, "<html>Bad Gateway</html>");
        let err = decode_reply::<Value>(&r).unwrap_err();
        assert!(matches!(err, GenerateError::TransportError { ref detail } if detail.contains("502")));
    }

    #[test]
    fn undecodable_success_is_transport_error() {
        let r = reply(200, "not json");
        assert!(matches!(
            decode_reply::<Value>(&r),
            Err(GenerateError::TransportError { .. })
        ));
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let s = snippet(long.as_bytes());
        assert!(s.ends_with('\u{2026}'));
        assert_eq!(s.chars().count(), 201);
    }
}
