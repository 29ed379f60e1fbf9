use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::api::middleware::auth::{AdminUser, AppState};
use crate::error::AppError;
use crate::models::event::{CreateEventData, Event};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    name: String,
    description: Option<String>,
    event_date: Option<NaiveDate>,
}

async fn create_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("event name is required".to_string()));
    }

    let event = Event::create(
        &state.pool,
        CreateEventData {
            name: req.name.trim().to_string(),
            description: req.description.filter(|s| !s.trim().is_empty()),
            event_date: req.event_date,
        },
    )
    .await?;

    tracing::info!(event_id = %event.id, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event added successfully", "event": event })),
    ))
}

async fn list_events(State(state): State<AppState>) -> Result<Json<JsonValue>, AppError> {
    let events = Event::list(&state.pool).await?;

    Ok(Json(json!({ "data": events })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/admin/events", post(create_event))
}
