//! Error types for the shot2code library.
//!
//! Two error types reflect the two halves of the pipeline:
//!
//! * [`IntakeError`]: the image could not be acquired (unreadable file,
//!   empty buffer, not an image, malformed base64). Nothing was sent.
//!
//! * [`GenerateError`]: the generation attempt failed. Every variant is
//!   terminal for the attempt; nothing is retried automatically. The
//!   `Display` text of each variant is what a user sees in place of code.
//!
//! `GenerateError` is `Clone` because a [`crate::session::GenerationSession`]
//! keeps the most recent failure as its displayed result.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to acquire or decode a source image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the file.
    #[error("Failed to read '{path}': {detail}")]
    Read { path: PathBuf, detail: String },

    /// Zero bytes were supplied.
    #[error("Image is empty")]
    Empty,

    /// The bytes are not one of the supported image encodings.
    #[error("Unsupported image format (first bytes: {magic:02x?}); expected PNG, JPEG, GIF, WebP or BMP")]
    UnsupportedFormat { magic: Vec<u8> },

    /// The base64 text (or data URL payload) could not be decoded.
    #[error("Image payload is not valid base64: {detail}")]
    InvalidBase64 { detail: String },

    /// A newer image selection started while this one was being read.
    #[error("Image selection was replaced by a newer one")]
    Superseded,
}

/// All errors returned by a generation attempt.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The image could not be read or decoded.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// The requested framework is not one of `html`, `tailwind`, `react`.
    #[error("Unsupported framework '{value}'; choose one of: html, tailwind, react")]
    InvalidSelection { value: String },

    /// Generation was requested before any image was selected.
    #[error("Please upload an image first")]
    NoImage,

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured provider is missing credentials or is unknown.
    #[error("Provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Network failure, or a non-2xx reply without a readable error body.
    #[error("Transport error: {detail}")]
    TransportError { detail: String },

    /// The provider answered with a structured error envelope.
    #[error("Provider error: {message}")]
    ProviderError {
        /// HTTP status of the reply, when the error arrived over HTTP.
        status: Option<u16>,
        message: String,
    },

    /// The provider reported success but returned no usable text.
    #[error("No code generated")]
    EmptyResult,

    /// The provider did not answer within the configured timeout.
    #[error("Provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Session errors ────────────────────────────────────────────────────
    /// A newer generation was started before this one completed; this
    /// result was discarded.
    #[error("Generation #{request_id} was superseded by a newer request")]
    Superseded { request_id: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GenerateError {
    /// Build a `TransportError` from anything printable.
    pub(crate) fn transport(detail: impl std::fmt::Display) -> Self {
        GenerateError::TransportError {
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display_carries_message() {
        let e = GenerateError::ProviderError {
            status: Some(400),
            message: "API key not valid".into(),
        };
        assert_eq!(e.to_string(), "Provider error: API key not valid");
    }

    #[test]
    fn empty_result_display() {
        assert_eq!(GenerateError::EmptyResult.to_string(), "No code generated");
    }

    #[test]
    fn intake_error_is_transparent() {
        let e: GenerateError = IntakeError::Empty.into();
        assert_eq!(e.to_string(), "Image is empty");
    }

    #[test]
    fn unsupported_format_shows_magic() {
        let e = IntakeError::UnsupportedFormat {
            magic: vec![0x25, 0x50, 0x44, 0x46],
        };
        assert!(e.to_string().contains("25"), "got: {e}");
    }

    #[test]
    fn timeout_display() {
        let e = GenerateError::Timeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn invalid_selection_names_value() {
        let e = GenerateError::InvalidSelection {
            value: "vue".into(),
        };
        assert!(e.to_string().contains("'vue'"));
    }
}
