//! Output of the finished document: file write or HTTP serving.

use std::fs;
use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use tracing::info;

use refdocs_error::{Error, ErrorKind, Result};

/// Write `doc` to `path`, creating parent directories.
pub fn write_file(path: &Path, doc: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            Error::from(e)
                .with_operation("output::write_file")
                .with_context("dir", dir.display().to_string())
        })?;
    }
    fs::write(path, doc).map_err(|e| {
        Error::from(e)
            .with_operation("output::write_file")
            .with_context("path", path.display().to_string())
    })?;
    info!("written to {}", path.display());
    Ok(())
}

/// Go-style `:port` addresses listen on every interface.
pub fn listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Every path answers with the same precomputed document.
pub fn router(doc: String) -> Router {
    let doc: Arc<str> = Arc::from(doc);
    Router::new()
        .fallback(serve_doc)
        .with_state(doc)
        .layer(middleware::from_fn(log_latency))
}

async fn serve_doc(State(doc): State<Arc<str>>) -> Html<String> {
    Html(doc.to_string())
}

async fn log_latency(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!(path = %path, "request took {:?}", start.elapsed());
    response
}

fn serve_failed(addr: &str, err: io::Error) -> Error {
    Error::new(ErrorKind::ServeFailed, format!("http server on {addr} failed"))
        .with_operation("output::serve")
        .set_source(err)
}

/// Bind `addr` and serve `doc` until the process is stopped.
pub fn serve(addr: &str, doc: String) -> Result<()> {
    let addr = listen_addr(addr);
    let listener = TcpListener::bind(&addr).map_err(|e| serve_failed(&addr, e))?;
    info!("server listening on {}", addr);
    serve_on(listener, doc)
}

/// Serve `doc` on an already bound listener with a current-thread runtime.
pub fn serve_on(listener: TcpListener, doc: String) -> Result<()> {
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_default();
    listener
        .set_nonblocking(true)
        .map_err(|e| serve_failed(&addr, e))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| serve_failed(&addr, e))?;

    runtime
        .block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener)?;
            axum::serve(listener, router(doc)).await
        })
        .map_err(|e| serve_failed(&addr, e))
}
