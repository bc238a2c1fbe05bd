//! Embedded web UI and JSON API for ola.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page chat UI with per-model metrics and rating controls
//! - JSON API endpoints for models, the chat session, votes, and metrics
//!
//! Launched via `ola serve` (default: `http://127.0.0.1:3000`).

mod api;
mod frontend;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{error, info};

use crate::backend::ChatBackend;
use crate::session::ChatSession;

/// A handler's answer, converted to a `tiny_http` response at the edge.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body,
        }
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }).to_string().into_bytes())
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut resp = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        if let Ok(header) = Header::from_bytes("Content-Type", self.content_type) {
            resp.add_header(header);
        }
        resp
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the server on `addr` and block the current thread.
///
/// Requests are handled one at a time, so the session has a single owner
/// and at most one chat turn is in flight. Errors are answered per request
/// without stopping the server.
pub fn serve<B: ChatBackend>(
    addr: &str,
    open_browser_on_start: bool,
    session: &mut ChatSession<B>,
) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    info!(%addr, "ola server listening");
    println!("ola running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open_browser_on_start {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            tracing::debug!(error = %e, "could not open browser");
        }
    }

    for mut request in server.incoming_requests() {
        let start = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = match dispatch(session, &method, &url, body.as_deref()) {
            Ok(reply) => reply,
            Err(e) => {
                error!(%method, %url, error = %e, "request failed");
                Reply::error(500, &e.to_string())
            }
        };

        let status = reply.status;
        if let Err(e) = request.respond(reply.into_response()) {
            tracing::debug!(error = %e, "client went away before the response");
        }

        info!(
            %method,
            path = url.split('?').next().unwrap_or(&url),
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request"
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<B: ChatBackend>(
    session: &mut ChatSession<B>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Reply> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Ok(Reply::html(frontend::INDEX_HTML))
        }

        // API: backend and session
        (&Method::Get, "/api/models") => api::get_models(session),
        (&Method::Get, "/api/session") => api::get_session(session),
        (&Method::Post, "/api/session") => api::post_session(session, body),
        (&Method::Post, "/api/chat") => api::post_chat(session, body),

        // API: metrics
        (&Method::Post, "/api/vote") => api::post_vote(session, body),
        (&Method::Get, "/api/metrics") => api::get_metrics(session, url),
        (&Method::Post, "/api/metrics/reset") => api::post_metrics_reset(session),

        (&Method::Get, "/api/health") => api::get_health(session),

        _ => Ok(Reply::error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
