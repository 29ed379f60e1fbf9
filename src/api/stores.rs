use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::api::middleware::auth::{AdminUser, AppState, AuthenticatedUser};
use crate::error::AppError;
use crate::models::rating::StoreRating;
use crate::models::store::{CreateStoreData, Store, UpdateStoreData};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoreRequest {
    name: String,
    logo_url: String,
    #[serde(rename = "type")]
    store_type: String,
    description: Option<String>,
}

async fn create_store(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("store name is required".to_string()));
    }
    if req.logo_url.trim().is_empty() {
        return Err(AppError::Validation("store logo is required".to_string()));
    }
    if req.store_type.trim().is_empty() {
        return Err(AppError::Validation("store type is required".to_string()));
    }

    let store = Store::create(
        &state.pool,
        CreateStoreData {
            name: req.name.trim().to_string(),
            logo_url: req.logo_url.trim().to_string(),
            store_type: req.store_type.trim().to_string(),
            description: req.description.filter(|s| !s.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(store_id = %store.id, admin_id = %admin.user_id, "Store created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Store added successfully", "store": store })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStoreRequest {
    name: Option<String>,
    logo_url: Option<String>,
    #[serde(rename = "type")]
    store_type: Option<String>,
    description: Option<String>,
}

async fn update_store(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(store_id): Path<Uuid>,
    Json(req): Json<UpdateStoreRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let data = UpdateStoreData {
        name: req.name.filter(|s| !s.trim().is_empty()),
        logo_url: req.logo_url.filter(|s| !s.trim().is_empty()),
        store_type: req.store_type.filter(|s| !s.trim().is_empty()),
        description: req.description.filter(|s| !s.trim().is_empty()),
    };

    if data.is_empty() {
        return Err(AppError::Validation(
            "no updatable fields provided".to_string(),
        ));
    }

    let store = Store::update(&state.pool, store_id, data)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    tracing::info!(store_id = %store.id, "Store updated");

    Ok(Json(
        json!({ "message": "Store updated successfully", "store": store }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
struct FaqEntry {
    question: String,
    answer: String,
}

async fn set_store_faqs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(store_id): Path<Uuid>,
    Json(faqs): Json<Vec<FaqEntry>>,
) -> Result<Json<JsonValue>, AppError> {
    let store = Store::set_faq(&state.pool, store_id, json!(faqs))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    Ok(Json(
        json!({ "message": "Store FAQs updated successfully", "store": store }),
    ))
}

#[derive(Debug, Deserialize)]
struct RateStoreRequest {
    rating: i16,
}

async fn rate_store(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(store_id): Path<Uuid>,
    Json(req): Json<RateStoreRequest>,
) -> Result<Json<JsonValue>, AppError> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    Store::find_by_id(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    let store = StoreRating::submit(&state.pool, user.user_id, store_id, req.rating)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    tracing::info!(store_id = %store.id, user_id = %user.user_id, "Rating added");

    Ok(Json(
        json!({ "message": "Rating added successfully", "store": store }),
    ))
}

async fn list_stores(State(state): State<AppState>) -> Result<Json<Vec<Store>>, AppError> {
    let stores = Store::list(&state.pool).await?;

    Ok(Json(stores))
}

async fn get_store(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<Store>, AppError> {
    let store = Store::find_by_id(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    Ok(Json(store))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list_stores))
        .route("/api/stores/:store_id", get(get_store))
        .route("/api/stores/:store_id/ratings", post(rate_store))
        .route("/api/admin/stores", post(create_store))
        .route("/api/admin/stores/:store_id", patch(update_store))
        .route("/api/admin/stores/:store_id/faqs", put(set_store_faqs))
}
