//! Pipeline stages for screenshot-to-code generation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the provider call stays isolated from pure text handling.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ encode ──▶ llm ──▶ postprocess
//! (bytes)    (base64)   (provider)  (fences)
//! ```
//!
//! 1. [`intake`]: read a file, raw bytes or base64 text and sniff the
//!    media type; also holds the "current image" slot
//! 2. [`encode`]: base64 payload and `data:` preview URI
//! 3. [`llm`]: the provider call under a deadline; the only stage with
//!    network I/O
//! 4. [`postprocess`]: strip the fence pair models wrap code in

pub mod encode;
pub mod intake;
pub mod llm;
pub mod postprocess;
