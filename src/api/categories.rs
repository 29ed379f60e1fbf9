use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::api::middleware::auth::{AdminUser, AppState};
use crate::error::AppError;
use crate::models::category::Category;

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    description: Option<String>,
}

async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "category name is required".to_string(),
        ));
    }

    let category = Category::create(
        &state.pool,
        req.name.trim(),
        req.description.as_deref().filter(|s| !s.trim().is_empty()),
    )
    .await?;

    tracing::info!(category_id = %category.id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Category added successfully", "category": category })),
    ))
}

#[derive(Debug, Deserialize)]
struct UpdateCategoryRequest {
    name: Option<String>,
    description: Option<String>,
}

async fn update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category_id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let category = Category::update(
        &state.pool,
        category_id,
        req.name.filter(|s| !s.trim().is_empty()),
        req.description.filter(|s| !s.trim().is_empty()),
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category_id)))?;

    Ok(Json(
        json!({ "message": "Category updated successfully", "category": category }),
    ))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = Category::list(&state.pool).await?;

    Ok(Json(categories))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/admin/categories", post(create_category))
        .route("/api/admin/categories/:category_id", patch(update_category))
}
