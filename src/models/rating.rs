use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::store::Store;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoreRating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

impl StoreRating {
    /// Records a rating and folds it into the store's aggregates. Both
    /// statements run in one transaction so the aggregates never drift from
    /// the submitted rows, and the increments happen in the database rather
    /// than as a read-modify-write.
    pub async fn submit(
        pool: &PgPool,
        user_id: Uuid,
        store_id: Uuid,
        rating: i16,
    ) -> Result<Option<Store>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO store_ratings (user_id, store_id, rating)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(store_id)
        .bind(rating)
        .execute(&mut *tx)
        .await?;

        let store = sqlx::query_as::<_, Store>(
            r#"
            UPDATE stores
            SET total_ratings = total_ratings + $2,
                ratings_count = ratings_count + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(store_id)
        .bind(rating as i64)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(store)
    }
}
