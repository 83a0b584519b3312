// Dev server - static file serving for the site directory
//
// A thin axum server that maps request paths onto the site directory:
// "/" serves index.html, extensions map through a fixed MIME table,
// missing files get a small HTML 404 page. If the requested port is
// taken the server walks forward until it finds a free one.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode, Uri},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

const COMPONENT: &str = "DevServer";

/// How many consecutive ports to try past the configured one
const PORT_FALLBACK_ATTEMPTS: u16 = 10;

/// MIME type for a file path, by extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
struct ServeState {
    root: Arc<PathBuf>,
}

/// Serve the site directory until the shutdown signal fires
pub async fn start_server(
    root: PathBuf,
    addr: SocketAddr,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let state = ServeState {
        root: Arc::new(root),
    };

    let app = Router::new()
        .fallback(get(serve_file))
        .with_state(state);

    let listener = bind_with_fallback(addr).await?;
    let bound = listener.local_addr().context("Failed to read bound address")?;
    tracing::info!(component = COMPONENT, "Serving on http://{bound}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .context("Dev server failed")?;

    tracing::info!(component = COMPONENT, "Dev server stopped");
    Ok(())
}

/// Bind the requested port, walking forward when it is already taken
async fn bind_with_fallback(addr: SocketAddr) -> Result<TcpListener> {
    let mut candidate = addr;
    for _ in 0..PORT_FALLBACK_ATTEMPTS {
        match TcpListener::bind(candidate).await {
            Ok(listener) => {
                if candidate.port() != addr.port() {
                    tracing::warn!(
                        component = COMPONENT,
                        "Port {} in use, using {} instead",
                        addr.port(),
                        candidate.port()
                    );
                }
                return Ok(listener);
            }
            Err(_) => {
                candidate.set_port(candidate.port().wrapping_add(1));
            }
        }
    }
    anyhow::bail!(
        "No free port in {}..{}",
        addr.port(),
        addr.port() + PORT_FALLBACK_ATTEMPTS
    )
}

async fn serve_file(State(state): State<ServeState>, uri: Uri) -> Response<Body> {
    // Uri::path() already excludes the query string
    let path = uri.path();
    let relative = if path == "/" {
        "index.html"
    } else {
        path.trim_start_matches('/')
    };

    // Never serve outside the site root
    if relative.split('/').any(|segment| segment == "..") {
        return not_found(path);
    }

    let full = state.root.join(relative);
    match tokio::fs::read(&full).await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_for(&full))
            .body(Body::from(bytes))
            .unwrap_or_else(|_| internal_error()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => not_found(path),
        Err(error) => {
            tracing::error!(component = COMPONENT, "Read failed for {relative}: {error}");
            internal_error()
        }
    }
}

fn not_found(requested: &str) -> Response<Body> {
    let body = format!(
        "<html><head><title>404 - File Not Found</title></head>\
         <body><h1>404 - File Not Found</h1>\
         <p>The requested file <code>{requested}</code> was not found.</p>\
         <p><a href=\"/\">Go back to home</a></p></body></html>"
    );
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/html")
        .body(Body::from(body))
        .unwrap_or_else(|_| internal_error())
}

fn internal_error() -> Response<Body> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Body::from("Internal Server Error"))
        .unwrap_or_else(|_| Response::new(Body::from("Internal error building error response")))
}
