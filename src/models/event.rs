use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A sale event ("Black Friday", "Back to School") coupons can be tagged
/// with at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEventData {
    pub name: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
}

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEventData) -> Result<Self, sqlx::Error> {
        let event = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO events (name, description, event_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.event_date)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM events ORDER BY event_date NULLS LAST, name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(events)
    }
}
