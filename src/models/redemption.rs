use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// One row per (user, coupon) pair. Rows are written exactly once and never
/// mutated; the composite primary key on the table is what makes redemption
/// at-most-once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Redemption {
    pub user_id: Uuid,
    pub coupon_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
}

impl Redemption {
    /// Whether the user has already redeemed the coupon. Pure lookup.
    pub async fn exists(
        pool: &PgPool,
        user_id: Uuid,
        coupon_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM redeemed_coupons WHERE user_id = $1 AND coupon_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(coupon_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Inserts the ledger row. A duplicate attempt surfaces as a unique
    /// violation from the insert itself; callers must treat that as the
    /// conflict signal instead of pre-checking, so concurrent attempts
    /// cannot both succeed.
    pub async fn record(
        pool: &PgPool,
        user_id: Uuid,
        coupon_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let redemption = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO redeemed_coupons (user_id, coupon_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(coupon_id)
        .fetch_one(pool)
        .await?;

        Ok(redemption)
    }

    /// Lists a user's redemptions, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let redemptions = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM redeemed_coupons WHERE user_id = $1 ORDER BY redeemed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(redemptions)
    }

    /// Authoritative redemption count for a coupon, for reconciling the
    /// advisory tally on the coupon row.
    pub async fn count_for_coupon(pool: &PgPool, coupon_id: Uuid) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM redeemed_coupons WHERE coupon_id = $1
            "#,
        )
        .bind(coupon_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
