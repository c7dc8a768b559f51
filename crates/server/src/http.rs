//! HTTP Endpoints
//!
//! REST API for call creation and readout, provider webhooks, and supplier
//! search.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use supplier_voice_config::ServerConfig;
use supplier_voice_core::InquiryContext;
use supplier_voice_persistence::{CallLogStore, CallRecord, SearchLogStore};
use supplier_voice_search::SupplierSearchRequest;
use supplier_voice_session::{SessionEvent, SessionSnapshot};
use supplier_voice_telephony::{
    twiml, webhook_event, RecordingCallback, StatusCallback, StatusKind,
};

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Call lifecycle
        .route("/api/calls", post(create_call))
        .route("/api/calls/:call_id/status", get(call_status))
        .route("/api/calls/:call_id/finding", get(call_finding))
        // Provider webhooks
        .route("/telephony/webhook/:call_id", post(recording_webhook))
        .route("/telephony/call-status/:call_id", post(status_webhook))
        .route(
            "/telephony/recording-status/:call_id",
            post(recording_status_webhook),
        )
        // Supplier search
        .route("/api/search/suppliers", post(search_suppliers))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Middleware
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.config.server) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

/// CORS layer per the server configuration
///
/// Disabled means no layer at all; an empty origin list (or `*`) allows
/// any origin.
fn cors_layer(server: &ServerConfig) -> Option<CorsLayer> {
    if !server.cors_enabled {
        return None;
    }

    let origins = if server.cors_origins.is_empty() || server.cors_origins.iter().any(|o| o == "*")
    {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            server
                .cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

fn xml_response(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml")], body)
}

/// Render the session's instructions against this deployment's callback base
fn render(state: &AppState, call_id: &str, instructions: &[supplier_voice_core::TelephonyInstruction]) -> String {
    twiml::render_instructions(
        instructions,
        &state.config.server.public_base_url,
        call_id,
        state.config.call.recording_max_secs,
    )
}

/// Write the terminal session to the call log, when a store is configured
async fn persist_if_terminal(state: &AppState, snapshot: &SessionSnapshot) {
    let Some(persistence) = &state.persistence else {
        return;
    };
    if snapshot.terminal_at.is_none() {
        return;
    }

    let record = CallRecord::build(
        &snapshot.call_id,
        &snapshot.inquiry.phone_number,
        &snapshot.inquiry.request_prompt,
        &snapshot.state.to_string(),
        snapshot.started_at,
        &snapshot.history,
        snapshot.finding.as_ref(),
        snapshot.failure_reason.as_deref(),
    );

    match record {
        Ok(record) => {
            if let Err(e) = persistence.calls.record(&record).await {
                tracing::warn!(call_id = %snapshot.call_id, "Call log write failed: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!(call_id = %snapshot.call_id, "Call record build failed: {}", e);
        }
    }
}

/// Create call request
#[derive(Debug, Deserialize)]
struct CreateCallRequest {
    phone_number: String,
    request_prompt: String,
}

/// Create call response
#[derive(Debug, Serialize)]
struct CreateCallResponse {
    call_id: String,
    status: &'static str,
}

/// E.164 shape: a `+` followed by 7 to 15 digits
fn is_e164(phone: &str) -> bool {
    match phone.strip_prefix('+') {
        Some(digits) => {
            (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Start an outbound inquiry call
///
/// Acknowledged immediately; greeting synthesis and the provider dial run
/// as a background task, and dial failures surface through the status
/// readout rather than this response.
async fn create_call(
    State(state): State<AppState>,
    Json(request): Json<CreateCallRequest>,
) -> Result<(StatusCode, Json<CreateCallResponse>), ServerError> {
    let phone_number = request.phone_number.trim().to_string();
    let request_prompt = request.request_prompt.trim().to_string();

    if !is_e164(&phone_number) {
        return Err(ServerError::InvalidRequest(
            "phone_number must be E.164, e.g. +15551234567".to_string(),
        ));
    }
    if request_prompt.is_empty() {
        return Err(ServerError::InvalidRequest(
            "request_prompt must not be empty".to_string(),
        ));
    }

    let call_id = uuid::Uuid::new_v4().to_string();
    let inquiry = InquiryContext::new(&phone_number, &request_prompt);

    tokio::spawn(dial_out(state, call_id.clone(), inquiry));

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateCallResponse {
            call_id,
            status: "queued",
        }),
    ))
}

/// Open the session, synthesize the greeting, and dial the supplier
async fn dial_out(state: AppState, call_id: String, inquiry: InquiryContext) {
    let phone_number = inquiry.phone_number.clone();

    let (handle, instructions) = state.registry.open_session(&call_id, inquiry).await;
    let greeting_twiml = render(&state, &call_id, &instructions);
    let status_callback = format!(
        "{}/telephony/call-status/{}",
        state.config.server.public_base_url, call_id
    );

    match state
        .telephony
        .create_call(&phone_number, &greeting_twiml, &status_callback)
        .await
    {
        Ok(outcome) => {
            handle.set_provider_sid(&outcome.call_sid);
            tracing::info!(
                call_id = %call_id,
                call_sid = %outcome.call_sid,
                status = %outcome.status,
                "Inquiry call dialed"
            );
        }
        Err(e) => {
            tracing::error!(call_id = %call_id, "Dial failed: {}", e);
            let _ = handle
                .deliver(SessionEvent::ProviderFailed {
                    reason: e.to_string(),
                })
                .await;
            persist_if_terminal(&state, &handle.snapshot()).await;
        }
    }
}

/// Recorded supplier response is ready; answer with the next TwiML
async fn recording_webhook(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Form(payload): Form<RecordingCallback>,
) -> impl IntoResponse {
    let Some(handle) = state.registry.get(&call_id) else {
        tracing::debug!(call_id, "Recording webhook for unknown call");
        return xml_response("<Response/>".to_string());
    };

    let recording_id = payload
        .recording_sid
        .clone()
        .or_else(|| payload.recording_url.clone())
        .unwrap_or_else(|| format!("{}-unmarked", payload.call_sid));

    // A failed download degrades to an empty utterance; the dialogue
    // engine re-prompts rather than the call dying here.
    let audio = match &payload.recording_url {
        Some(url) => match state.telephony.fetch_recording(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(call_id, "Recording download failed: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let instructions = match handle
        .deliver(SessionEvent::RecordingReady {
            recording_id,
            audio,
        })
        .await
    {
        Ok(instructions) => instructions,
        Err(e) => {
            tracing::warn!(call_id, "Session rejected recording event: {}", e);
            return xml_response("<Response/>".to_string());
        }
    };

    persist_if_terminal(&state, &handle.snapshot()).await;

    if instructions.is_empty() {
        xml_response("<Response/>".to_string())
    } else {
        xml_response(render(&state, &call_id, &instructions))
    }
}

/// Provider call status transition
async fn status_webhook(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Form(payload): Form<StatusCallback>,
) -> StatusCode {
    let Some(handle) = state.registry.get(&call_id) else {
        tracing::debug!(call_id, status = %payload.call_status, "Status webhook for unknown call");
        return StatusCode::OK;
    };

    let event = match webhook_event(&payload.call_status) {
        StatusKind::Answered => SessionEvent::CallAnswered,
        StatusKind::Ended => SessionEvent::CallEnded,
        StatusKind::Failed => SessionEvent::ProviderFailed {
            reason: payload.call_status.clone(),
        },
        StatusKind::Ignorable => return StatusCode::OK,
    };

    if let Err(e) = handle.deliver(event).await {
        tracing::warn!(call_id, "Session rejected status event: {}", e);
        return StatusCode::OK;
    }

    persist_if_terminal(&state, &handle.snapshot()).await;
    StatusCode::OK
}

/// Recording lifecycle notification, informational only
async fn recording_status_webhook(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Form(payload): Form<RecordingCallback>,
) -> StatusCode {
    if let Some(handle) = state.registry.get(&call_id) {
        let _ = handle
            .notify(SessionEvent::RecordingStatus {
                recording_id: payload.recording_sid.unwrap_or_default(),
                status: payload.recording_status.unwrap_or_default(),
            })
            .await;
    }
    StatusCode::OK
}

/// Current call state
async fn call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if let Some(handle) = state.registry.get(&call_id) {
        let snapshot = handle.snapshot();
        return Ok(Json(serde_json::json!({
            "call_id": snapshot.call_id,
            "state": snapshot.state,
            "turn_count": snapshot.turn_count,
            "started_at": snapshot.started_at,
        })));
    }

    // Reaped sessions are still answerable from the call log.
    if let Some(persistence) = &state.persistence {
        if let Ok(Some(record)) = persistence.calls.get(&call_id).await {
            return Ok(Json(serde_json::json!({
                "call_id": record.call_id,
                "state": record.final_state,
                "started_at": record.started_at,
                "ended_at": record.ended_at,
            })));
        }
    }

    Err(ServerError::UnknownCall(call_id))
}

/// Extracted finding for a finished call
async fn call_finding(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if let Some(handle) = state.registry.get(&call_id) {
        let snapshot = handle.snapshot();
        let Some(finding) = snapshot.finding else {
            // Not terminal yet, or failed before extraction could run.
            return Err(ServerError::UnknownCall(call_id));
        };
        return Ok(Json(serde_json::json!({
            "call_id": snapshot.call_id,
            "state": snapshot.state,
            "finding": finding,
        })));
    }

    if let Some(persistence) = &state.persistence {
        if let Ok(Some(record)) = persistence.calls.get(&call_id).await {
            if let Some(finding_json) = record.finding_json {
                let finding: serde_json::Value =
                    serde_json::from_str(&finding_json).unwrap_or(serde_json::Value::Null);
                return Ok(Json(serde_json::json!({
                    "call_id": record.call_id,
                    "state": record.final_state,
                    "finding": finding,
                })));
            }
        }
    }

    Err(ServerError::UnknownCall(call_id))
}

/// Run the supplier search pipeline
async fn search_suppliers(
    State(state): State<AppState>,
    Json(request): Json<SupplierSearchRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if request.search_query.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "search_query must not be empty".to_string(),
        ));
    }

    let outcome = match state.search.search_suppliers(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Supplier search failed: {}", e);
            return Err(ServerError::Search(e));
        }
    };

    let mut search_id = None;
    if let Some(persistence) = &state.persistence {
        match serde_json::to_string(&outcome.leads) {
            Ok(leads_json) => {
                let record = supplier_voice_persistence::SearchRecord::new(
                    &request.search_query,
                    &request.strategy.to_string(),
                    &outcome.queries_used,
                    leads_json,
                    outcome.leads.len() as i32,
                    outcome.elapsed_ms as i64,
                );
                match record {
                    Ok(record) => {
                        if let Err(e) = persistence.searches.record(&record).await {
                            tracing::warn!("Search log write failed: {}", e);
                        } else {
                            search_id = Some(record.search_id);
                        }
                    }
                    Err(e) => tracing::warn!("Search record build failed: {}", e),
                }
            }
            Err(e) => tracing::warn!("Lead serialization failed: {}", e),
        }
    }

    Ok(Json(serde_json::json!({
        "search_id": search_id,
        "suppliers": outcome.leads,
        "total_suppliers": outcome.leads.len(),
        "queries_used": outcome.queries_used,
        "search_time_ms": outcome.elapsed_ms,
    })))
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "active_calls": state.registry.count(),
    }))
}
