//! Image encoding: raw bytes → base64 payload + data-URL preview.
//!
//! Multimodal APIs (Gemini, Anthropic, Hugging Face) take images as base64
//! text embedded in the JSON request body, tagged with a media type. The same
//! base64 text prefixed with `data:<media-type>;base64,` gives a
//! self-contained URI that a browser or terminal viewer can render directly.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::debug;

/// An image ready to be sent to a provider.
///
/// Immutable once built: the media type was sniffed from the bytes and the
/// base64 text is derived from them deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    media_type: String,
    base64: String,
    byte_len: usize,
}

impl EncodedImage {
    /// Encode `bytes` whose media type is already known.
    ///
    /// Callers normally go through [`crate::pipeline::intake`], which
    /// validates the bytes and sniffs `media_type` first.
    pub fn new(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        let base64 = to_base64(bytes);
        debug!("Encoded image → {} bytes base64", base64.len());
        Self {
            media_type: media_type.into(),
            base64,
            byte_len: bytes.len(),
        }
    }

    /// MIME type, e.g. `image/png`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Standard-alphabet, padded base64 of the image bytes.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// Size of the original image in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// `data:` URI suitable for previewing the image.
    pub fn data_url(&self) -> String {
        data_url(&self.media_type, &self.base64)
    }
}

/// Base64-encode bytes with the standard padded alphabet.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Build a `data:<media_type>;base64,<payload>` URI.
pub fn data_url(media_type: &str, base64: &str) -> String {
    format!("data:{};base64,{}", media_type, base64)
}
