//! HTTP front for the explorer
//!
//! `/api/*` routes call into [`FileSystemService`]; every other path falls
//! through to the static front-end directory.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use colored::Colorize;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::filesystem::dispatch::ContentResponse;
use crate::filesystem::FileSystemService;
use crate::protocol::{DiskUsage, FileEntry, FileSystemError, PathQuery};

/// Status sent when a viewer was launched instead of returning content
pub const STREAMING_STATUS: u16 = 250;

pub type SharedService = Arc<FileSystemService>;

pub fn router(service: SharedService) -> Router {
    let static_dir = service.config().static_dir.clone();

    Router::new()
        .route("/api/files", get(list_files))
        .route("/api/file", get(get_file))
        .route("/api/disk-usage", get(disk_usage))
        .fallback_service(get_service(ServeDir::new(static_dir)).handle_error(|_| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve until Ctrl+C (or SIGTERM on Unix)
pub async fn run(service: FileSystemService) -> std::io::Result<()> {
    let service = Arc::new(service);
    let port = service.config().port;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Explorer HTTP server on port {}", port);
    print_banner(&service, port);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn list_files(
    State(fs): State<SharedService>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Vec<FileEntry>>, FileSystemError> {
    let path = query.path.unwrap_or_default();
    let entries = fs.ops().list_directory(&path).await?;
    Ok(Json(entries.iter().map(|e| e.to_protocol()).collect()))
}

async fn get_file(
    State(fs): State<SharedService>,
    Query(query): Query<PathQuery>,
) -> Result<Response, FileSystemError> {
    let path = query.path.unwrap_or_default();
    let response = match fs.dispatcher().serve(&path).await? {
        ContentResponse::Binary {
            mime_type,
            file,
            len,
        } => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(mime_type)),
                (header::CONTENT_LENGTH, HeaderValue::from(len)),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response(),
        ContentResponse::Converted { body } => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        ContentResponse::Launched { tool } => {
            let status = StatusCode::from_u16(STREAMING_STATUS).unwrap_or(StatusCode::ACCEPTED);
            tracing::debug!("Handed {:?} to {}", path, tool);
            (status, "Streaming started").into_response()
        }
        ContentResponse::Text { body } => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
    };
    Ok(response)
}

async fn disk_usage(State(fs): State<SharedService>) -> Result<Json<DiskUsage>, FileSystemError> {
    Ok(Json(fs.disk().report().await?))
}

impl IntoResponse for FileSystemError {
    fn into_response(self) -> Response {
        let status = match &self {
            FileSystemError::PathEscape { .. } | FileSystemError::NotADirectory { .. } => {
                StatusCode::BAD_REQUEST
            }
            FileSystemError::NotFound { .. } => StatusCode::NOT_FOUND,
            FileSystemError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FileSystemError::StatFailure { .. } | FileSystemError::ToolFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(self.to_body())).into_response()
    }
}

fn print_banner(service: &FileSystemService, port: u16) {
    let config = service.config();
    println!();
    println!("  {}", "xplore".cyan().bold());
    println!("  Serving files from:  {}", service.validator().root().display());
    println!("  Serving static from: {}", config.static_dir.display());
    println!("  Local:   {}", format!("http://localhost:{}", port).green());
    if let Ok(ip) = local_ip_address::local_ip() {
        println!("  Network: {}", format!("http://{}:{}", ip, port).green());
    }
    println!("  {}", "Press Ctrl+C to stop".dimmed());
    println!();
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(
                "Failed to set up SIGTERM handler: {:?}. Only Ctrl+C will work for shutdown.",
                e
            );
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down (Ctrl+C)");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down (Ctrl+C)");
        }
        _ = sigterm.recv() => {
            tracing::info!("Shutting down (SIGTERM)");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down (Ctrl+C)");
}
