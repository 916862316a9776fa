//! HTTP server setup and routing

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use platen_core::{
    BinarizeRequest, DEFAULT_DOWNLOAD_TTL, Error, Orientation, PageSize, render_document,
    resolve_page_config,
};

use crate::context::SharedContext;

const PDF_MIME: &str = "application/pdf";

/// Service status response
#[derive(Serialize)]
struct StatusResponse {
    name: &'static str,
    status: &'static str,
    #[serde(rename = "templatesRoot")]
    templates_root: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Document generation request body
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GenerateRequest {
    props: Map<String, Value>,
    #[serde(default)]
    format: OutputFormat,
    #[serde(default)]
    size: Option<PageSize>,
    #[serde(default)]
    orientation: Option<Orientation>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Pdf,
    Base64,
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Base64Response {
    document_id: String,
    format: &'static str,
    data: String,
    mime: &'static str,
    size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonResponse {
    document_id: String,
    format: &'static str,
    url: String,
    expires_in_ms: u128,
}

/// Service status endpoint
async fn status(State(ctx): State<SharedContext>) -> impl IntoResponse {
    Json(StatusResponse {
        name: "platen-server",
        status: "ok",
        templates_root: ctx.config.templates_dir.display().to_string(),
    })
}

async fn health() -> &'static str {
    "ok"
}

/// Consume a download token and stream its payload.
///
/// Unknown, expired and already-consumed tokens all present identically.
async fn download(State(ctx): State<SharedContext>, Path(token): Path<String>) -> Response {
    ctx.downloads.prune_expired().await;

    match ctx.downloads.consume(&token).await {
        Some(entry) => (
            [
                (header::CONTENT_TYPE, entry.mime_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            entry.payload,
        )
            .into_response(),
        None => not_found_response("Download expired"),
    }
}

/// Render a registered document and answer in the requested format.
async fn generate(
    State(ctx): State<SharedContext>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let json: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return bad_request_response("Invalid JSON body"),
    };
    let request: GenerateRequest = match serde_json::from_value(json) {
        Ok(r) => r,
        Err(e) => return bad_request_response(&format!("Invalid request: {e}")),
    };

    let page = resolve_page_config(
        &ctx.config.default_page,
        request.size.clone(),
        request.orientation,
    );

    let rendered = match render_document(&ctx.registry, &document_id, Some(&request.props)).await {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let base_url = request_base_url(&headers, &ctx);

    let pdf = match ctx
        .binarizer
        .binarize(&BinarizeRequest {
            base_url: base_url.clone(),
            markup: rendered.markup,
            page,
        })
        .await
    {
        Ok(bytes) => bytes,
        Err(e) => return error_response(&e),
    };

    match request.format {
        OutputFormat::Base64 => {
            let data = BASE64.encode(&pdf);
            Json(Base64Response {
                document_id,
                format: "base64",
                data,
                mime: PDF_MIME,
                size: pdf.len(),
            })
            .into_response()
        }
        OutputFormat::Json => {
            let token = ctx.downloads.issue_default(pdf, PDF_MIME).await;
            Json(JsonResponse {
                document_id,
                format: "json",
                url: format!("{base_url}api/downloads/{token}"),
                expires_in_ms: DEFAULT_DOWNLOAD_TTL.as_millis(),
            })
            .into_response()
        }
        OutputFormat::Pdf => (
            [
                (header::CONTENT_TYPE, PDF_MIME),
                (header::CACHE_CONTROL, "no-store"),
            ],
            pdf,
        )
            .into_response(),
    }
}

/// 404 handler
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// API-key guard.
///
/// Static assets, downloads (the token is the capability) and the root
/// status page stay reachable without the key.
async fn require_api_key(
    State(ctx): State<SharedContext>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(key) = &ctx.config.api_key {
        let path = request.uri().path();
        let exempt = path.starts_with("/static")
            || path.starts_with("/api/downloads")
            || (path == "/" && request.method() == Method::GET);

        if !exempt {
            let supplied = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if supplied != Some(key.as_str()) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Unauthorized".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    next.run(request).await
}

/// Absolute base URL for links we hand back to the caller.
fn request_base_url(headers: &HeaderMap, ctx: &SharedContext) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}:{}", ctx.config.host, ctx.config.port));
    format!("http://{host}/")
}

fn not_found_response(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn bad_request_response(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn error_response(err: &Error) -> Response {
    match err {
        Error::Shared(inner) => error_response(inner.as_ref()),
        Error::DocumentNotFound(_) => not_found_response("Unknown document"),
        Error::InvalidPageSize(_) => bad_request_response(&err.to_string()),
        other => {
            error!(error = %other, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal Server Error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Build the axum router
pub fn build_router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health))
        .route("/api/downloads/{token}", get(download))
        .route("/api/documents/{document_id}", post(generate))
        .nest_service("/static", ServeDir::new(&ctx.config.static_dir))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Run the platen server.
///
/// This function blocks until the server is shut down.
pub async fn run_server(ctx: SharedContext) -> platen_core::Result<()> {
    let addr = format!("{}:{}", ctx.config.host, ctx.config.port);
    let router = build_router(ctx);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "platen server listening");

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<GenerateRequest>(
            r#"{"props": {}, "layout": "A4"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("layout"));
    }

    #[test]
    fn generate_request_rejects_malformed_sizes() {
        assert!(
            serde_json::from_str::<GenerateRequest>(r#"{"props": {}, "size": "sideways"}"#)
                .is_err()
        );
    }

    #[test]
    fn generate_request_defaults_to_pdf() {
        let request: GenerateRequest = serde_json::from_str(r#"{"props": {}}"#).unwrap();
        assert!(request.format == OutputFormat::Pdf);
        assert!(request.size.is_none());
        assert!(request.orientation.is_none());
    }

    #[test]
    fn props_are_required() {
        assert!(serde_json::from_str::<GenerateRequest>(r#"{"format": "pdf"}"#).is_err());
    }
}
