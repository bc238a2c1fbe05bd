//! JSON API handlers for the chat UI.
//!
//! Each handler corresponds to an API endpoint and returns a JSON [`Reply`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::{ChatBackend, ModelInfo};
use crate::metrics::DisplayStats;
use crate::relay::RelayErrorKind;
use crate::session::{ChatSession, SessionError};
use crate::transcript::{SessionState, Turn};

use super::Reply;

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SelectModelRequest {
    model: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    content: String,
}

#[derive(Deserialize)]
struct VoteRequest {
    model: String,
    good: bool,
}

#[derive(Serialize)]
struct SessionResponse<'a> {
    model: Option<&'a str>,
    state: SessionState,
    turns: &'a [Turn],
}

#[derive(Serialize)]
struct ChatResponse {
    model: String,
    content: String,
    elapsed_secs: f64,
    tokens: usize,
    stats: DisplayStats,
}

#[derive(Serialize)]
struct ErrorResponse {
    /// Inline text for the transcript, e.g. `[Error: model not found]`.
    error: String,
    detail: String,
}

/// One row of the metrics table.
#[derive(Serialize)]
struct MetricsRow {
    model: String,
    #[serde(flatten)]
    stats: DisplayStats,
}

#[derive(Serialize)]
struct HealthResponse {
    backend_reachable: bool,
    store_path: Option<String>,
    store_degraded: bool,
    models_tracked: usize,
    selected_model: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Reply> {
    let body = serde_json::to_vec(data).context("failed to serialize JSON response")?;
    Ok(Reply::json(status, body))
}

fn parse_body<'a, T: Deserialize<'a>>(body: Option<&'a str>) -> Result<T> {
    serde_json::from_str(body.unwrap_or("{}")).context("invalid JSON in request body")
}

/// Extract and percent-decode a query parameter. `+` is read as a space, as
/// browsers encode form values. Values that do not decode to UTF-8 are
/// treated as absent.
fn query_param(url: &str, name: &str) -> Option<String> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k != name || v.is_empty() {
            return None;
        }
        urlencoding::decode(&v.replace('+', " "))
            .ok()
            .map(|decoded| decoded.into_owned())
    })
}

fn error_status(err: &SessionError) -> u16 {
    match err {
        SessionError::NoModelSelected | SessionError::EmptyInput => 400,
        SessionError::Superseded(_) => 409,
        SessionError::Relay(e) => match e.kind() {
            RelayErrorKind::InvalidRequest => 400,
            RelayErrorKind::NetworkFailure | RelayErrorKind::BackendError => 502,
        },
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/models`: backend model list; refreshes sizes in the catalog.
pub fn get_models<B: ChatBackend>(session: &mut ChatSession<B>) -> Result<Reply> {
    match session.refresh_models() {
        Ok(models) => json_response::<Vec<ModelInfo>>(200, &models),
        Err(e) => {
            tracing::warn!(error = %e, "model listing failed");
            json_response(500, &serde_json::json!({ "error": "Failed to fetch models" }))
        }
    }
}

/// `GET /api/session`: selected model and current transcript.
pub fn get_session<B: ChatBackend>(session: &ChatSession<B>) -> Result<Reply> {
    let transcript = session.transcript();
    json_response(
        200,
        &SessionResponse {
            model: transcript.model(),
            state: transcript.state(),
            turns: transcript.current(),
        },
    )
}

/// `POST /api/session`: switch model, starting an empty transcript.
///
/// Expects JSON body: `{ "model": "llama3.2:1b" }`
pub fn post_session<B: ChatBackend>(
    session: &mut ChatSession<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: SelectModelRequest = parse_body(body)?;
    let model = req.model.trim();
    if model.is_empty() {
        return json_response(400, &serde_json::json!({ "error": "model is required" }));
    }
    session.select_model(model);
    get_session(session)
}

/// `POST /api/chat`: run one turn against the selected model.
///
/// Expects JSON body: `{ "content": "hi" }`
pub fn post_chat<B: ChatBackend>(
    session: &mut ChatSession<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: ChatRequest = parse_body(body)?;

    match session.submit(&req.content) {
        Ok(outcome) => json_response(
            200,
            &ChatResponse {
                model: outcome.model,
                content: outcome.content,
                elapsed_secs: outcome.elapsed_secs,
                tokens: outcome.tokens,
                stats: outcome.stats,
            },
        ),
        Err(e) => json_response(
            error_status(&e),
            &ErrorResponse {
                error: e.display_message(),
                detail: e.to_string(),
            },
        ),
    }
}

/// `POST /api/vote`: thumbs up/down for a model.
///
/// Expects JSON body: `{ "model": "llama3.2:1b", "good": true }`
pub fn post_vote<B: ChatBackend>(
    session: &mut ChatSession<B>,
    body: Option<&str>,
) -> Result<Reply> {
    let req: VoteRequest = parse_body(body)?;
    if req.model.trim().is_empty() {
        return json_response(400, &serde_json::json!({ "error": "model is required" }));
    }
    let stats = session.vote(&req.model, req.good);
    json_response(
        200,
        &MetricsRow {
            model: req.model,
            stats,
        },
    )
}

/// `GET /api/metrics[?model=NAME]`: all rows, or one model's summary.
pub fn get_metrics<B: ChatBackend>(session: &ChatSession<B>, url: &str) -> Result<Reply> {
    let metrics = session.metrics();

    if let Some(model) = query_param(url, "model") {
        let stats = metrics.summarize(&model);
        return json_response(200, &MetricsRow { model, stats });
    }

    let rows: Vec<MetricsRow> = metrics
        .summarize_all()
        .into_iter()
        .map(|(model, stats)| MetricsRow { model, stats })
        .collect();
    json_response(200, &rows)
}

/// `POST /api/metrics/reset`: clear every model's stats.
pub fn post_metrics_reset<B: ChatBackend>(session: &mut ChatSession<B>) -> Result<Reply> {
    session.reset_metrics();
    json_response(
        200,
        &serde_json::json!({
            "success": true,
            "message": "Metrics reset",
        }),
    )
}

/// `GET /api/health`: backend reachability and store status.
pub fn get_health<B: ChatBackend>(session: &ChatSession<B>) -> Result<Reply> {
    let store = session.metrics().store();
    json_response(
        200,
        &HealthResponse {
            backend_reachable: session.relay().backend().is_healthy(),
            store_path: store.path().map(|p| p.display().to_string()),
            store_degraded: store.is_degraded(),
            models_tracked: session.metrics().catalog().len(),
            selected_model: session.transcript().model().map(str::to_string),
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
