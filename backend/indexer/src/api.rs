//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventRecord, LoanSummary};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

/// Build the HTTP router over `state`.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/events", get(get_loan_events))
        .route("/borrowers/:address/events", get(get_borrower_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LoanEventsResponse {
    pub loan_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct BorrowerEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

fn internal_error(e: IndexerError) -> Response {
    error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /loans/:id`
///
/// Returns the loan's lifecycle state folded from its indexed events, or
/// 404 when nothing has been indexed for it.
pub async fn get_loan(State(state): State<Arc<ApiState>>, Path(loan_id): Path<String>) -> Response {
    match db::get_events_for_loan(&state.pool, &loan_id).await {
        Ok(events) => match LoanSummary::from_events(&loan_id, &events) {
            Some(summary) => (StatusCode::OK, Json(summary)).into_response(),
            None => error_response(StatusCode::NOT_FOUND, format!("loan {loan_id} not indexed")),
        },
        Err(e) => internal_error(e),
    }
}

/// `GET /loans/:id/events`
///
/// Returns all indexed events for the given loan identifier.
pub async fn get_loan_events(
    State(state): State<Arc<ApiState>>,
    Path(loan_id): Path<String>,
) -> Response {
    match db::get_events_for_loan(&state.pool, &loan_id).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(LoanEventsResponse {
                    loan_id,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /borrowers/:address/events`
///
/// Returns every indexed event acted by `address`.
pub async fn get_borrower_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::get_events_for_actor(&state.pool, &address).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(BorrowerEventsResponse {
                    address,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /events`
///
/// Returns all indexed events across all loans.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(AllEventsResponse { count, events })).into_response()
        }
        Err(e) => internal_error(e),
    }
}
