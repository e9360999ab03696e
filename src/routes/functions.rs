// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Function registration and invocation routes (called by the event platform).

use crate::error::{AppError, Result};
use crate::functions::{FunctionId, Registration, RunOutput};
use crate::models::EventEnvelope;
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Response header carrying the outcome of a single-event run.
pub const RUN_OUTCOME_HEADER: &str = "x-run-outcome";

/// Registration route.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/functions", get(registration))
}

/// Invocation route.
pub fn invoke_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/functions/{function_id}", post(invoke))
}

/// Describe the registered functions and their triggers.
async fn registration(State(state): State<Arc<AppState>>) -> Json<Registration> {
    Json(state.client.registration())
}

/// Invocation body: a single envelope, a batch, or both.
#[derive(Deserialize, Debug, Default)]
struct InvokeRequest {
    #[serde(default)]
    event: Option<EventEnvelope>,
    #[serde(default)]
    events: Option<Vec<EventEnvelope>>,
}

impl InvokeRequest {
    /// Events for `function`: batches prefer `events`, single-event
    /// functions prefer `event`.
    fn into_events(self, function: FunctionId) -> Vec<EventEnvelope> {
        let single = self.event.map(|e| vec![e]);
        if function.is_batched() {
            self.events.or(single)
        } else {
            single.or(self.events)
        }
        .unwrap_or_default()
    }
}

/// Run one function (POST).
///
/// Errors are returned as non-2xx so the platform records a failed run and
/// redelivers; malformed input is acknowledged with 200.
async fn invoke(
    State(state): State<Arc<AppState>>,
    Path(function_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Response> {
    let function = FunctionId::parse(&function_id)
        .ok_or_else(|| AppError::NotFound(format!("Function {} not registered", function_id)))?;

    let request: InvokeRequest = match serde_json::from_value(payload) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(function_id = %function, error = %e, "Failed to parse invocation body");
            InvokeRequest::default()
        }
    };
    let events = request.into_events(function);

    tracing::info!(
        function_id = %function,
        event_count = events.len(),
        "Function invoked"
    );

    let response = match state.functions.run(function, &events).await? {
        RunOutput::User(outcome) => {
            (StatusCode::OK, [(RUN_OUTCOME_HEADER, outcome.as_str())]).into_response()
        }
        RunOutput::Batch(result) => Json(result).into_response(),
    };
    Ok(response)
}
