//! HTTP proxy endpoint.
//!
//! A browser front end cannot hold provider credentials, so it posts the
//! screenshot here and the server makes the provider call on its behalf.
//!
//! ```text
//! POST    /api/generate  {image, framework}  → 200 {code} | 4xx/5xx {error}
//! OPTIONS /api/generate                      → 200 (CORS preflight)
//! *       /api/generate                      → 405 {error}
//! ```
//!
//! Every response, including errors and rejections, carries the same
//! permissive CORS header set.

use crate::error::GenerateError;
use crate::generate::{GeneratedCode, Generator};
use crate::pipeline::intake;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Default cap on request body size (20 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Route path of the generation endpoint.
pub const GENERATE_PATH: &str = "/api/generate";

const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-credentials", "true"),
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-methods",
        "GET,OPTIONS,PATCH,DELETE,POST,PUT",
    ),
    (
        "access-control-allow-headers",
        "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version",
    ),
];

/// Body of `POST /api/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Base64 image data, bare or as a data URL.
    pub image: String,
    /// `html`, `tailwind` or `react`.
    pub framework: String,
}

#[derive(Debug, Serialize)]
struct CodeBody {
    code: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error response: status plus `{error}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<GenerateError> for ApiError {
    fn from(e: GenerateError) -> Self {
        ApiError::new(status_for(&e), e.to_string())
    }
}

/// HTTP status for a failed generation.
pub fn status_for(e: &GenerateError) -> StatusCode {
    match e {
        GenerateError::Intake(_)
        | GenerateError::InvalidSelection { .. }
        | GenerateError::NoImage => StatusCode::BAD_REQUEST,
        GenerateError::ProviderError { status, .. } => status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        GenerateError::EmptyResult => StatusCode::INTERNAL_SERVER_ERROR,
        GenerateError::TransportError { .. } => StatusCode::BAD_GATEWAY,
        GenerateError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        GenerateError::ProviderNotConfigured { .. }
        | GenerateError::InvalidConfig(_)
        | GenerateError::Superseded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the proxy router around a shared generator.
pub fn router(generator: Arc<Generator>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            GENERATE_PATH,
            post(generate)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::map_response(add_cors_headers))
        .with_state(generator)
}

/// Bind `addr` and serve the proxy until the process is stopped.
pub async fn serve(
    addr: SocketAddr,
    generator: Arc<Generator>,
    max_body_bytes: usize,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        "Proxy listening on http://{}{} (backend: {})",
        listener.local_addr()?,
        GENERATE_PATH,
        generator.backend_name()
    );
    axum::serve(listener, router(generator, max_body_bytes)).await
}

async fn generate(
    State(generator): State<Arc<Generator>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CodeBody>, ApiError> {
    let body = body.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
    let request: GenerateRequest = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    })?;

    match run(&generator, &request).await {
        Ok(generated) => Ok(Json(CodeBody {
            code: generated.code,
        })),
        Err(e) => {
            warn!("Generation failed: {}", e);
            Err(e.into())
        }
    }
}

async fn run(generator: &Generator, request: &GenerateRequest) -> Result<GeneratedCode, GenerateError> {
    let image = intake::from_base64(&request.image)?;
    generator.generate(&image, &request.framework).await
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for &(name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}
