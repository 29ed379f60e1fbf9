use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    coupon::{Coupon, CouponKind, CreateCouponData},
    redemption::Redemption,
    store::Store,
};

#[derive(thiserror::Error, Debug)]
pub enum CouponLifecycleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Store {0} not found")]
    StoreNotFound(Uuid),

    #[error("Coupon {0} not found")]
    CouponNotFound(Uuid),

    #[error("This coupon has expired")]
    Expired,

    #[error("You have already redeemed this coupon")]
    AlreadyRedeemed,
}

/// Fields accepted for a new coupon. `due_date` arrives as the raw
/// `YYYY-MM-DD` string the admin form submits and is validated here.
#[derive(Debug, Clone)]
pub struct NewCouponFields {
    pub title: String,
    pub code: String,
    pub kind: String,
    pub category: Option<String>,
    pub link: Option<String>,
    pub due_date: String,
    pub description: Option<String>,
    pub events: Vec<Uuid>,
}

fn validate_fields(
    store_id: Uuid,
    fields: NewCouponFields,
) -> Result<CreateCouponData, CouponLifecycleError> {
    if fields.title.trim().is_empty() {
        return Err(CouponLifecycleError::Validation(
            "title is required".to_string(),
        ));
    }
    if fields.code.trim().is_empty() {
        return Err(CouponLifecycleError::Validation(
            "coupon code is required".to_string(),
        ));
    }

    let kind = CouponKind::parse(&fields.kind).ok_or_else(|| {
        CouponLifecycleError::Validation(format!(
            "unknown coupon kind {:?} (expected \"Codes\" or \"Deals\")",
            fields.kind
        ))
    })?;

    let due_date = NaiveDate::parse_from_str(fields.due_date.trim(), "%Y-%m-%d").map_err(|_| {
        CouponLifecycleError::Validation("due date must be a YYYY-MM-DD date".to_string())
    })?;

    Ok(CreateCouponData {
        store_id,
        title: fields.title.trim().to_string(),
        code: fields.code.trim().to_uppercase(),
        kind,
        category: fields.category.filter(|s| !s.trim().is_empty()),
        link: fields.link.filter(|s| !s.trim().is_empty()),
        due_date,
        description: fields.description.filter(|s| !s.trim().is_empty()),
        events: fields.events,
    })
}

/// A coupon stays redeemable through its due date; only a strictly past
/// date counts as expired.
fn is_expired(due_date: NaiveDate, today: NaiveDate) -> bool {
    due_date < today
}

/// Validates the fields, resolves the store, and creates the coupon. The
/// store's stock counter moves with the insert in one transaction.
#[tracing::instrument(skip(pool, fields))]
pub async fn add_coupon(
    pool: &PgPool,
    store_id: Uuid,
    fields: NewCouponFields,
) -> Result<Coupon, CouponLifecycleError> {
    let data = validate_fields(store_id, fields)?;

    Store::find_by_id(pool, store_id)
        .await?
        .ok_or(CouponLifecycleError::StoreNotFound(store_id))?;

    let coupon = Coupon::create_with_stock(pool, data).await?;

    tracing::info!(coupon_id = %coupon.id, "Coupon created");

    Ok(coupon)
}

/// Deletes the coupon, moving the owning store's stock down with it.
/// Returns the affected store id for caller reporting.
#[tracing::instrument(skip(pool))]
pub async fn remove_coupon(
    pool: &PgPool,
    coupon_id: Uuid,
) -> Result<Uuid, CouponLifecycleError> {
    let store_id = Coupon::delete_with_stock(pool, coupon_id)
        .await?
        .ok_or(CouponLifecycleError::CouponNotFound(coupon_id))?;

    tracing::info!(store_id = %store_id, "Coupon deleted");

    Ok(store_id)
}

/// Redeems a coupon for a user: resolves the coupon, rejects past-due
/// coupons, and writes the ledger row. A duplicate attempt (including a
/// caller retry after a success) lands on the `AlreadyRedeemed` path via
/// the ledger's uniqueness constraint.
#[tracing::instrument(skip(pool))]
pub async fn redeem(
    pool: &PgPool,
    user_id: Uuid,
    coupon_id: Uuid,
) -> Result<Redemption, CouponLifecycleError> {
    let coupon = Coupon::find_by_id(pool, coupon_id)
        .await?
        .ok_or(CouponLifecycleError::CouponNotFound(coupon_id))?;

    if is_expired(coupon.due_date, Utc::now().date_naive()) {
        return Err(CouponLifecycleError::Expired);
    }

    let redemption = match Redemption::record(pool, user_id, coupon_id).await {
        Ok(redemption) => redemption,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(CouponLifecycleError::AlreadyRedeemed);
        }
        Err(e) => return Err(e.into()),
    };

    // The ledger row above is the source of truth; the per-coupon tally is
    // advisory, so a failure here is logged and the redemption stands.
    if let Err(e) = Coupon::increment_redemption_count(pool, coupon_id).await {
        tracing::warn!(error = %e, "Failed to update redemption tally");
    }

    tracing::info!("Coupon redeemed");

    Ok(redemption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::store::CreateStoreData;

    fn fields() -> NewCouponFields {
        NewCouponFields {
            title: "10% off".to_string(),
            code: "save10".to_string(),
            kind: "Codes".to_string(),
            category: None,
            link: Some("https://example.com/deal".to_string()),
            due_date: "2030-01-15".to_string(),
            description: None,
            events: Vec::new(),
        }
    }

    #[test]
    fn accepts_complete_fields_and_normalizes_code() {
        let data = validate_fields(Uuid::new_v4(), fields()).unwrap();
        assert_eq!(data.code, "SAVE10");
        assert_eq!(data.kind, CouponKind::Codes);
        assert_eq!(data.due_date, NaiveDate::from_ymd_opt(2030, 1, 15).unwrap());
    }

    #[test]
    fn rejects_blank_title() {
        let result = validate_fields(
            Uuid::new_v4(),
            NewCouponFields {
                title: "   ".to_string(),
                ..fields()
            },
        );
        assert!(matches!(result, Err(CouponLifecycleError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_kind() {
        let result = validate_fields(
            Uuid::new_v4(),
            NewCouponFields {
                kind: "Cashback".to_string(),
                ..fields()
            },
        );
        assert!(matches!(result, Err(CouponLifecycleError::Validation(_))));
    }

    #[test]
    fn rejects_malformed_due_date() {
        let result = validate_fields(
            Uuid::new_v4(),
            NewCouponFields {
                due_date: "15/01/2030".to_string(),
                ..fields()
            },
        );
        assert!(matches!(result, Err(CouponLifecycleError::Validation(_))));
    }

    #[test]
    fn blank_optionals_become_none() {
        let data = validate_fields(
            Uuid::new_v4(),
            NewCouponFields {
                link: Some("  ".to_string()),
                description: Some(String::new()),
                ..fields()
            },
        )
        .unwrap();
        assert!(data.link.is_none());
        assert!(data.description.is_none());
    }

    #[test]
    fn due_today_is_not_expired() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert!(!is_expired(today, today));
    }

    #[test]
    fn due_yesterday_is_expired() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert!(is_expired(today.pred_opt().unwrap(), today));
    }

    // The tests below exercise the storage-backed invariants end to end.

    async fn test_pool() -> sqlx::PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_store(pool: &sqlx::PgPool) -> Store {
        Store::create(
            pool,
            CreateStoreData {
                name: "Test Store".to_string(),
                logo_url: "https://cdn.example.com/logo.png".to_string(),
                store_type: "Fashion".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database (DATABASE_URL)
    async fn add_redeem_conflict_delete_roundtrip() {
        let pool = test_pool().await;
        let store = seed_store(&pool).await;
        assert_eq!(store.stock, 0);

        let coupon = add_coupon(&pool, store.id, fields()).await.unwrap();
        assert_eq!(coupon.store_id, store.id);

        let store = Store::find_by_id(&pool, store.id).await.unwrap().unwrap();
        assert_eq!(store.stock, 1);

        let user_id = Uuid::new_v4();
        redeem(&pool, user_id, coupon.id).await.unwrap();
        assert!(Redemption::exists(&pool, user_id, coupon.id).await.unwrap());

        let second = redeem(&pool, user_id, coupon.id).await;
        assert!(matches!(second, Err(CouponLifecycleError::AlreadyRedeemed)));
        assert_eq!(
            Redemption::count_for_coupon(&pool, coupon.id).await.unwrap(),
            1
        );

        let affected = remove_coupon(&pool, coupon.id).await.unwrap();
        assert_eq!(affected, store.id);

        let store = Store::find_by_id(&pool, store.id).await.unwrap().unwrap();
        assert_eq!(store.stock, 0);
        assert!(Coupon::find_by_id(&pool, coupon.id).await.unwrap().is_none());

        let gone = remove_coupon(&pool, coupon.id).await;
        assert!(matches!(gone, Err(CouponLifecycleError::CouponNotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database (DATABASE_URL)
    async fn concurrent_redemptions_have_a_single_winner() {
        let pool = test_pool().await;
        let store = seed_store(&pool).await;
        let coupon = add_coupon(&pool, store.id, fields()).await.unwrap();
        let user_id = Uuid::new_v4();

        let (a, b, c) = tokio::join!(
            redeem(&pool, user_id, coupon.id),
            redeem(&pool, user_id, coupon.id),
            redeem(&pool, user_id, coupon.id),
        );

        let results = [a, b, c];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(
                result,
                Err(CouponLifecycleError::AlreadyRedeemed)
            ));
        }
        assert_eq!(
            Redemption::count_for_coupon(&pool, coupon.id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database (DATABASE_URL)
    async fn expired_coupon_is_not_redeemable() {
        let pool = test_pool().await;
        let store = seed_store(&pool).await;

        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let coupon = add_coupon(
            &pool,
            store.id,
            NewCouponFields {
                due_date: yesterday.format("%Y-%m-%d").to_string(),
                ..fields()
            },
        )
        .await
        .unwrap();

        let user_id = Uuid::new_v4();
        let result = redeem(&pool, user_id, coupon.id).await;
        assert!(matches!(result, Err(CouponLifecycleError::Expired)));
        assert!(!Redemption::exists(&pool, user_id, coupon.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database (DATABASE_URL)
    async fn add_coupon_for_missing_store_fails() {
        let pool = test_pool().await;
        let result = add_coupon(&pool, Uuid::new_v4(), fields()).await;
        assert!(matches!(result, Err(CouponLifecycleError::StoreNotFound(_))));
    }
}
