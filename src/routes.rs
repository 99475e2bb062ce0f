use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{self, ApiKey};
use crate::error::AppError;
use crate::storage::{EventMeta, EventStorage, FileSystemStorage};

#[derive(Clone)]
pub struct AppState {
    pub storage: FileSystemStorage,
}

// ──────────────────────────────────────────────
// Router
// ──────────────────────────────────────────────

/// Builds the application router: a public health route plus the event
/// routes, which sit behind the API key middleware.
pub fn app(state: AppState, api_key: ApiKey, body_limit: usize) -> Router {
    let public = Router::new().route("/api/health", get(health));

    let protected = Router::new()
        .route("/api/events", post(ingest_event))
        .route("/api/events", get(list_events))
        .route("/api/events/{id}", get(get_event))
        .route("/api/events/{id}", delete(delete_event))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(
            api_key,
            auth::api_key_middleware,
        ));

    Router::new().merge(public).merge(protected).with_state(state)
}

// ──────────────────────────────────────────────
// Request / Response types
// ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct IngestResponse {
    pub id: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub events: Vec<EventMeta>,
}

// ──────────────────────────────────────────────
// Handlers
// ──────────────────────────────────────────────

pub async fn ingest_event(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let event_type = body
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if event_type.is_empty() {
        return Err(AppError::BadRequest(
            "Invalid event: missing or empty 'type' field.".into(),
        ));
    }

    let mut id = Uuid::new_v4()
        .to_string()
        .split('-')
        .next()
        .unwrap_or("unknown")
        .to_string();

    // Ensure uniqueness
    if state.storage.exists(&id).await? {
        id = Uuid::new_v4().to_string().replace('-', "")[..12].to_string();
    }

    let meta = state.storage.save(&id, &body).await?;

    tracing::info!(id = %id, event_type = %event_type, "Event stored");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            id: meta.id,
            received_at: meta.received_at,
        }),
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let payload = state.storage.load(&id).await?;
    Ok(Json(payload))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete(&id).await?;
    tracing::info!(id = %id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, AppError> {
    let events = state.storage.list().await?;
    Ok(Json(ListResponse { events }))
}

pub async fn health() -> &'static str {
    "ok"
}
