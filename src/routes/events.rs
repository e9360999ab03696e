// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event ingestion for the in-process dispatcher.

use crate::error::{AppError, Result};
use crate::models::EventEnvelope;
use crate::services::FailedRun;
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Event routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", post(ingest))
        .route("/api/runs/failed", get(failed_runs))
}

/// One envelope or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventBatch {
    Many(Vec<EventEnvelope>),
    One(EventEnvelope),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct IngestResponse {
    pub accepted: usize,
}

/// Queue events for dispatch (POST).
async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<EventBatch>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let events = match batch {
        EventBatch::Many(events) => events,
        EventBatch::One(event) => vec![event],
    };

    if let Some(position) = events.iter().position(|e| e.name.is_empty()) {
        return Err(AppError::BadRequest(format!(
            "Event at index {} has no name",
            position
        )));
    }

    let accepted = events.len();
    for event in events {
        tracing::debug!(event_name = %event.name, event_id = ?event.id, "Event received");
        state.dispatcher.send(event).await?;
    }

    tracing::info!(accepted, "Events queued for dispatch");
    Ok((StatusCode::ACCEPTED, Json(IngestResponse { accepted })))
}

/// Recent runs that exhausted their retries.
async fn failed_runs(State(state): State<Arc<AppState>>) -> Json<Vec<FailedRun>> {
    Json(state.dispatcher.failed_runs())
}
