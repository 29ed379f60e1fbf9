use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::api::middleware::auth::{AdminUser, AppState, AuthenticatedUser};
use crate::error::AppError;
use crate::models::coupon::Coupon;
use crate::models::redemption::Redemption;
use crate::models::store::Store;
use crate::services::coupon_lifecycle::{self, NewCouponFields};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCouponRequest {
    title: String,
    #[serde(rename = "type")]
    kind: String,
    category: Option<String>,
    coupon_code: String,
    due_date: String,
    #[serde(rename = "ref_link", alias = "link")]
    link: Option<String>,
    description: Option<String>,
    #[serde(default)]
    events: Vec<Uuid>,
}

async fn add_coupon(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(store_id): Path<Uuid>,
    Json(req): Json<AddCouponRequest>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    let coupon = coupon_lifecycle::add_coupon(
        &state.pool,
        store_id,
        NewCouponFields {
            title: req.title,
            code: req.coupon_code,
            kind: req.kind,
            category: req.category,
            link: req.link,
            due_date: req.due_date,
            description: req.description,
            events: req.events,
        },
    )
    .await?;

    tracing::info!(coupon_id = %coupon.id, admin_id = %admin.user_id, "Coupon added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Coupon added successfully", "coupon": coupon })),
    ))
}

async fn delete_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(coupon_id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let store_id = coupon_lifecycle::remove_coupon(&state.pool, coupon_id).await?;

    Ok(Json(json!({
        "message": format!("Coupon {} deleted successfully", coupon_id),
        "storeId": store_id,
    })))
}

async fn redeem_coupon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(coupon_id): Path<Uuid>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    coupon_lifecycle::redeem(&state.pool, user.user_id, coupon_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Coupon redemption successful" })),
    ))
}

async fn get_coupon(
    State(state): State<AppState>,
    Path(coupon_id): Path<Uuid>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = Coupon::find_by_id(&state.pool, coupon_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Coupon {} not found", coupon_id)))?;

    Ok(Json(coupon))
}

async fn list_store_coupons(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    Store::find_by_id(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {} not found", store_id)))?;

    let coupons = Coupon::list_by_store(&state.pool, store_id).await?;

    Ok(Json(coupons))
}

async fn my_redemptions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Redemption>>, AppError> {
    let redemptions = Redemption::list_by_user(&state.pool, user.user_id).await?;

    Ok(Json(redemptions))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/coupons/:coupon_id", get(get_coupon))
        .route("/api/coupons/:coupon_id/redeem", post(redeem_coupon))
        .route("/api/stores/:store_id/coupons", get(list_store_coupons))
        .route("/api/me/redemptions", get(my_redemptions))
        .route("/api/admin/stores/:store_id/coupons", post(add_coupon))
        .route("/api/admin/coupons/:coupon_id", delete(delete_coupon))
}
