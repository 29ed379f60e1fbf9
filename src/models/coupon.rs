use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Discriminates code-based offers from plain deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponKind {
    Codes,
    Deals,
}

impl CouponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponKind::Codes => "Codes",
            CouponKind::Deals => "Deals",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Codes" => Some(CouponKind::Codes),
            "Deals" => Some(CouponKind::Deals),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub code: String,
    pub kind: String, // "Codes" or "Deals"
    pub category: Option<String>,
    pub link: Option<String>,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    /// Advisory tally of successful redemptions; the redemption ledger is
    /// the authoritative record.
    pub redemption_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCouponData {
    pub store_id: Uuid,
    pub title: String,
    pub code: String,
    pub kind: CouponKind,
    pub category: Option<String>,
    pub link: Option<String>,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub events: Vec<Uuid>,
}

impl Coupon {
    /// Inserts the coupon, attaches any event associations, and bumps the
    /// owning store's stock, all in one transaction. A failure of any
    /// statement leaves none of them applied.
    pub async fn create_with_stock(
        pool: &PgPool,
        data: CreateCouponData,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let coupon = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO coupons (store_id, title, code, kind, category, link, due_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.store_id)
        .bind(&data.title)
        .bind(&data.code)
        .bind(data.kind.as_str())
        .bind(&data.category)
        .bind(&data.link)
        .bind(data.due_date)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await?;

        for event_id in &data.events {
            sqlx::query(
                r#"
                INSERT INTO coupon_events (coupon_id, event_id) VALUES ($1, $2)
                "#,
            )
            .bind(coupon.id)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE stores SET stock = stock + 1, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(data.store_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(coupon)
    }

    /// Deletes the coupon and decrements the owning store's stock in one
    /// transaction. Returns the affected store id, or `None` if the coupon
    /// id does not resolve.
    pub async fn delete_with_stock(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let store_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            DELETE FROM coupons WHERE id = $1 RETURNING store_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(store_id) = store_id else {
            return Ok(None);
        };

        // The deleted row's existence implies a prior increment, so the
        // GREATEST floor only matters if the counter was tampered with.
        sqlx::query(
            r#"
            UPDATE stores SET stock = GREATEST(stock - 1, 0), updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(store_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(store_id))
    }

    /// Finds a coupon by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let coupon = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM coupons WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(coupon)
    }

    /// Lists a store's coupons, soonest-expiring first
    pub async fn list_by_store(pool: &PgPool, store_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let coupons = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM coupons WHERE store_id = $1 ORDER BY due_date, created_at
            "#,
        )
        .bind(store_id)
        .fetch_all(pool)
        .await?;

        Ok(coupons)
    }

    /// Bumps the advisory redemption tally
    pub async fn increment_redemption_count(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE coupons SET redemption_count = redemption_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_both_variants() {
        assert_eq!(CouponKind::parse("Codes"), Some(CouponKind::Codes));
        assert_eq!(CouponKind::parse("Deals"), Some(CouponKind::Deals));
        assert_eq!(CouponKind::parse("codes"), None);
        assert_eq!(CouponKind::parse(""), None);
    }

    #[test]
    fn kind_round_trips_through_as_str() {
        for kind in [CouponKind::Codes, CouponKind::Deals] {
            assert_eq!(CouponKind::parse(kind.as_str()), Some(kind));
        }
    }
}
