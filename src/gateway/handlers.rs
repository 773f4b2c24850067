use super::{AppState, GenerateBody, VerifyBody};
use crate::error::RelayError;
use crate::security::{GateDecision, GateReason};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{Value, json};

type JsonResponse = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> JsonResponse {
    (status, Json(json!({ "error": message.into() })))
}

fn decision_body(decision: &GateDecision) -> Value {
    let mut body = json!({
        "allowed": decision.allowed,
        "reason": decision.reason,
        "attempts_remaining": decision.attempts_remaining,
        "message": decision.message,
    });
    if let Some(secs) = decision.retry_after_secs {
        body["retry_after"] = json!(secs);
    }
    body
}

fn verify_status(reason: GateReason) -> StatusCode {
    match reason {
        GateReason::Ok => StatusCode::OK,
        GateReason::WrongSecret => StatusCode::UNAUTHORIZED,
        GateReason::LockedOut => StatusCode::TOO_MANY_REQUESTS,
    }
}

fn relay_error_response(error: &RelayError) -> JsonResponse {
    match error {
        RelayError::Auth(decision) => {
            let mut body = decision_body(decision);
            body["error"] = json!(decision.message);
            (StatusCode::FORBIDDEN, Json(body))
        }
        RelayError::Validation(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            tracing::error!(error = %other, "request failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error while recording the request",
            )
        }
    }
}

/// GET /health -- always public
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/status -- service identity, no secrets
pub(super) async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.status().clone())
}

/// POST /api/verify -- credential check only
pub(super) async fn handle_verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON: {e}. Expected: {{\"secret\": \"...\"}}"),
            );
        }
    };

    match state.relay.verify(&body.secret) {
        Ok(decision) => (verify_status(decision.reason), Json(decision_body(&decision))),
        Err(e) => relay_error_response(&e),
    }
}

/// POST /api/generate -- gate, then generate (or fall back)
pub(super) async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON: {e}. Expected: {{\"secret\": \"...\", \"prompt\": \"...\"}}"),
            );
        }
    };

    match state.relay.generate(&body.secret, body.prompt.as_deref()).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode generation result");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode result")
            }
        },
        Err(e) => relay_error_response(&e),
    }
}
