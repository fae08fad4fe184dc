//! CLI binary for shot2code.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GeneratorConfig` and either prints generated code or runs the proxy.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use shot2code::server::{self, DEFAULT_MAX_BODY_BYTES};
use shot2code::{
    generate_file, Framework, GenerationProgressCallback, Generator, GeneratorConfig,
    ProgressCallback, ProviderKind,
};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the provider call is in flight.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading image…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_submit(&self, _request_id: u64, framework: Framework, backend: &str) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix("Generating");
        self.bar.set_message(format!("{framework} via {backend}…"));
    }

    fn on_complete(&self, _request_id: u64, code_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&format!("{code_len} chars generated")),
            self.elapsed()
        );
    }

    fn on_error(&self, _request_id: u64, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}  {}", red("✘"), red(error), self.elapsed());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # HTML + CSS to stdout (Gemini, key from GEMINI_API_KEY)
  shot2code generate screenshot.png

  # React component into a file, using Claude
  shot2code generate --framework react --provider anthropic shot.png -o App.jsx

  # Structured JSON result
  shot2code generate --json --framework tailwind shot.png > result.json

  # Run the browser-facing proxy
  shot2code serve --addr 0.0.0.0:3000

SUPPORTED PROVIDERS:
  Provider      Default model                           Output
  ───────────   ──────────────────────────────────────  ────────────────
  gemini        gemini-2.0-flash (default)              code
  anthropic     claude-sonnet-4-20250514                code
  huggingface   Salesforce/blip-image-captioning-large  caption template

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Google Gemini API key
  ANTHROPIC_API_KEY    Anthropic API key
  HF_API_TOKEN         Hugging Face token (optional)
  SHOT2CODE_PROVIDER   Override provider (gemini, anthropic, huggingface)
  SHOT2CODE_MODEL      Override model ID
  RUST_LOG             Override the log filter
"#;

/// Turn UI screenshots into HTML, Tailwind or React code.
#[derive(Parser, Debug)]
#[command(
    name = "shot2code",
    version,
    about = "Turn UI screenshots into HTML, Tailwind or React code using multimodal LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SHOT2CODE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SHOT2CODE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate code for one screenshot.
    Generate(GenerateArgs),
    /// Run the `POST /api/generate` proxy.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// Provider: gemini, anthropic, huggingface.
    #[arg(
        long,
        env = "SHOT2CODE_PROVIDER",
        long_help = "Inference provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini (google), anthropic (claude), huggingface (hf)."
    )]
    provider: Option<String>,

    /// Model ID (e.g. gemini-2.0-flash, claude-sonnet-4-20250514).
    #[arg(long, env = "SHOT2CODE_MODEL")]
    model: Option<String>,

    /// API key; defaults to the provider's key variable.
    #[arg(long)]
    api_key: Option<String>,

    /// Override the provider base URL.
    #[arg(long, env = "SHOT2CODE_BASE_URL")]
    base_url: Option<String>,

    /// Provider call timeout in seconds.
    #[arg(long, env = "SHOT2CODE_TIMEOUT", default_value_t = 60)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Screenshot file (PNG, JPEG, GIF, WebP or BMP).
    image: PathBuf,

    /// Target framework: html, tailwind, react.
    #[arg(short, long, default_value = "html")]
    framework: String,

    /// Write the code to this file instead of stdout. Without an extension,
    /// one matching the framework is added.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full result as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "SHOT2CODE_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the interesting part of `generate`; library INFO
    // logs would only tear it.
    let show_progress = match &cli.command {
        Command::Generate(args) => !cli.quiet && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Generate(args) => run_generate(args, show_progress).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_generate(args: GenerateArgs, show_progress: bool) -> Result<()> {
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&args.provider, progress)?;

    let result = generate_file(&args.image, &args.framework, &config).await;
    if let Some(ref spinner) = spinner {
        // Intake errors happen before any callback fires.
        spinner.bar.finish_and_clear();
    }
    let generated =
        result.with_context(|| format!("Generation failed for {}", args.image.display()))?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&generated).context("Failed to serialise result")?;
        println!("{json}");
    } else if let Some(ref output) = args.output {
        let path = &output_path(output, generated.framework);
        tokio::fs::write(path, generated.code.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("   {}  →  {}", dim(&generated.backend), bold(&path.display().to_string()));
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(generated.code.as_bytes())
            .context("Failed to write to stdout")?;
        if !generated.code.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// `-o page` becomes `page.html` / `page.jsx`; explicit extensions are kept.
fn output_path(path: &Path, framework: Framework) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(framework.file_extension())
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args.provider, None)?;
    let generator = Generator::new(&config).context("Failed to initialise provider")?;
    server::serve(args.addr, Arc::new(generator), args.max_body_bytes)
        .await
        .with_context(|| format!("Proxy server on {} failed", args.addr))
}

/// Map CLI args to `GeneratorConfig`.
fn build_config(args: &ProviderArgs, progress: Option<ProgressCallback>) -> Result<GeneratorConfig> {
    let provider: ProviderKind = match args.provider {
        Some(ref name) => name.parse().context("Invalid --provider")?,
        None => {
            GeneratorConfig::from_env()
                .context("Invalid provider environment")?
                .provider
        }
    };

    let api_key = args.api_key.clone().or_else(|| {
        std::env::var(provider.key_env_var())
            .ok()
            .filter(|k| !k.trim().is_empty())
    });

    let mut builder = GeneratorConfig::builder()
        .provider(provider)
        .timeout_secs(args.timeout);
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_extension_follows_framework() {
        assert_eq!(
            output_path(Path::new("out/page"), Framework::Html),
            PathBuf::from("out/page.html")
        );
        assert_eq!(
            output_path(Path::new("out/page"), Framework::Tailwind),
            PathBuf::from("out/page.html")
        );
        assert_eq!(
            output_path(Path::new("App"), Framework::React),
            PathBuf::from("App.jsx")
        );
    }

    #[test]
    fn explicit_output_extension_kept() {
        assert_eq!(
            output_path(Path::new("App.tsx"), Framework::React),
            PathBuf::from("App.tsx")
        );
    }
}
