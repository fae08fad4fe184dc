//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GeneratorConfigBuilder::progress_callback`] to hear when a
//! request is sent to the provider and when it finishes. The CLI uses this to
//! drive its spinner; a UI could use it to toggle a loading state.
//!
//! # Example
//!
//! ```rust
//! use shot2code::{GenerationProgressCallback, GeneratorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_complete(&self, request_id: u64, code_len: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{request_id}: {code_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { done: AtomicUsize::new(0) });
//! let config = GeneratorConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::Framework;
use std::sync::Arc;

/// Called by the generator around each provider call.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; the proxy
/// server shares one generator across request tasks.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called just before the request is sent.
    ///
    /// # Arguments
    /// * `request_id`: id of this generation (unique per generator)
    /// * `framework` : selected target framework
    /// * `backend`   : provider name
    fn on_submit(&self, request_id: u64, framework: Framework, backend: &str) {
        let _ = (request_id, framework, backend);
    }

    /// Called when code was produced.
    ///
    /// * `code_len`: byte length of the cleaned code
    fn on_complete(&self, request_id: u64, code_len: usize) {
        let _ = (request_id, code_len);
    }

    /// Called when the attempt failed.
    ///
    /// * `error`: user-displayable error description
    fn on_error(&self, request_id: u64, error: &str) {
        let _ = (request_id, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GeneratorConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
