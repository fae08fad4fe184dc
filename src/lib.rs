//! # shot2code
//!
//! Turn a UI screenshot into HTML + CSS, Tailwind markup or a React
//! component using a multimodal model (Gemini, Claude) as the code generator.
//!
//! ## Pipeline Overview
//!
//! ```text
//! screenshot
//!  │
//!  ├─ 1. Intake    read file / bytes / data URL, sniff media type
//!  ├─ 2. Encode    bytes → base64 payload + data-URL preview
//!  ├─ 3. Prompt    framework-specific instruction text
//!  ├─ 4. Provider  one call to Gemini / Anthropic / Hugging Face (60 s timeout)
//!  └─ 5. Clean     strip the outer ``` fence pair (or scaffold a caption)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shot2code::{pipeline::intake, Generator, GeneratorConfig, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .provider(ProviderKind::Gemini)
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let generator = Generator::new(&config)?;
//!
//!     let image = intake::from_path("screenshot.png").await?;
//!     let generated = generator.generate(&image, "tailwind").await?;
//!     println!("{}", generated.code);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The `POST /api/generate` proxy ([`server::router`], axum) |
//! | `cli`    | on      | The `shot2code` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Library-only use:
//! ```toml
//! shot2code = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Provider
//!
//! | Provider | Default model | Output |
//! |----------|---------------|--------|
//! | `gemini` | `gemini-2.0-flash` | code |
//! | `anthropic` | `claude-sonnet-4-20250514` | code |
//! | `huggingface` | `Salesforce/blip-image-captioning-large` | caption, wrapped in a starter template |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scaffold;
#[cfg(feature = "server")]
pub mod server;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{InferenceBackend, OutputKind};
pub use config::{Framework, GeneratorConfig, GeneratorConfigBuilder, ProviderKind};
pub use error::{GenerateError, IntakeError};
pub use generate::{generate_file, generate_file_sync, GeneratedCode, Generator};
pub use pipeline::encode::EncodedImage;
pub use pipeline::intake::ImageSlot;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{GenerationSession, GenerationState};
