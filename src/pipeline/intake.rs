//! Image intake: turn a user-supplied image into an [`EncodedImage`].
//!
//! Three sources are accepted: a file path (CLI), raw bytes (library
//! callers), and base64 text or a full data URL (the proxy endpoint, which
//! receives what a browser `FileReader` produced). Whatever the source, the
//! media type is sniffed from the decoded bytes rather than trusted from a
//! file extension or data-URL prefix.
//!
//! Size limits are left to the provider, which rejects oversized payloads
//! with its own error envelope.

use crate::error::IntakeError;
use crate::pipeline::encode::EncodedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Formats every supported provider accepts as inline image data.
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Validate raw image bytes and encode them.
pub fn from_bytes(bytes: &[u8]) -> Result<EncodedImage, IntakeError> {
    let media_type = sniff_media_type(bytes)?;
    Ok(EncodedImage::new(media_type, bytes))
}

/// Read an image file fully into memory and encode it.
pub async fn from_path(path: impl AsRef<Path>) -> Result<EncodedImage, IntakeError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_io_error(path, e))?;
    info!("Read {} bytes from {}", bytes.len(), path.display());
    from_bytes(&bytes)
}

/// Decode base64 text (bare, or a `data:…;base64,` URL) and encode it.
///
/// The data-URL prefix is discarded; the media type comes from the bytes.
pub fn from_base64(text: &str) -> Result<EncodedImage, IntakeError> {
    let payload = strip_data_url_prefix(text.trim());
    if payload.is_empty() {
        return Err(IntakeError::Empty);
    }
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| IntakeError::InvalidBase64 {
            detail: e.to_string(),
        })?;
    from_bytes(&bytes)
}

/// Return the media type for supported image bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Result<&'static str, IntakeError> {
    if bytes.is_empty() {
        return Err(IntakeError::Empty);
    }
    let unsupported = || IntakeError::UnsupportedFormat {
        magic: bytes.iter().take(4).copied().collect(),
    };
    let format = image::guess_format(bytes).map_err(|_| unsupported())?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(unsupported());
    }
    debug!("Sniffed image format: {:?}", format);
    Ok(format.to_mime_type())
}

/// `data:image/png;base64,AAAA` → `AAAA`. Anything else is returned as-is.
fn strip_data_url_prefix(text: &str) -> &str {
    if text.starts_with("data:") {
        if let Some((_, payload)) = text.split_once(',') {
            return payload;
        }
    }
    text
}

fn map_io_error(path: &Path, e: std::io::Error) -> IntakeError {
    let path = path.to_path_buf();
    match e.kind() {
        std::io::ErrorKind::NotFound => IntakeError::NotFound { path },
        std::io::ErrorKind::PermissionDenied => IntakeError::PermissionDenied { path },
        _ => IntakeError::Read {
            path,
            detail: e.to_string(),
        },
    }
}

/// The currently selected image.
///
/// Replacing the image is all-or-nothing: the new image is validated and
/// encoded before the slot is touched, and a failed replacement clears the
/// slot so no stale payload or preview survives it. Each replacement takes
/// a ticket when it starts; when selections overlap, only the most recently
/// started one may write.
#[derive(Debug, Default)]
pub struct ImageSlot {
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    image: Option<EncodedImage>,
    /// Last ticket handed out.
    latest: u64,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held image with `bytes`.
    pub fn set_image(&self, bytes: &[u8]) -> Result<EncodedImage, IntakeError> {
        let ticket = self.begin();
        self.store(ticket, from_bytes(bytes))
    }

    /// Replace the held image with the contents of a file.
    ///
    /// If another replacement starts while the file is being read, this one
    /// fails with `Superseded` and leaves the newer image in place.
    pub async fn set_image_from_path(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<EncodedImage, IntakeError> {
        let path = path.into();
        let ticket = self.begin();
        let result = from_path(&path).await;
        self.store(ticket, result)
    }

    /// The held image, if any.
    pub fn current(&self) -> Option<EncodedImage> {
        self.lock().image.clone()
    }

    fn begin(&self) -> u64 {
        let mut state = self.lock();
        state.latest += 1;
        state.latest
    }

    fn store(
        &self,
        ticket: u64,
        result: Result<EncodedImage, IntakeError>,
    ) -> Result<EncodedImage, IntakeError> {
        let mut state = self.lock();
        if ticket != state.latest {
            debug!("Image selection #{} superseded by #{}", ticket, state.latest);
            return Err(IntakeError::Superseded);
        }
        match result {
            Ok(image) => {
                state.image = Some(image.clone());
                Ok(image)
            }
            Err(e) => {
                state.image = None;
                Err(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        // The slot only ever holds a fully built value, so a poisoned lock
        // still guards consistent data.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
