use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub logo_url: String,
    pub store_type: String,
    pub description: Option<String>,
    pub faq: Option<JsonValue>, // JSONB list of {question, answer}
    /// Number of live coupons for this store. Maintained in the same
    /// transaction as every coupon insert/delete, never recomputed.
    pub stock: i32,
    pub total_ratings: i64,
    pub ratings_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateStoreData {
    pub name: String,
    pub logo_url: String,
    pub store_type: String,
    pub description: Option<String>,
}

/// Partial update of a store. Each `Some` field becomes a SET clause; the
/// set of updatable columns is fixed by the struct itself.
#[derive(Debug, Clone, Default)]
pub struct UpdateStoreData {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub store_type: Option<String>,
    pub description: Option<String>,
}

impl UpdateStoreData {
    fn changes(self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(v) = self.name {
            fields.push(("name", v));
        }
        if let Some(v) = self.logo_url {
            fields.push(("logo_url", v));
        }
        if let Some(v) = self.store_type {
            fields.push(("store_type", v));
        }
        if let Some(v) = self.description {
            fields.push(("description", v));
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo_url.is_none()
            && self.store_type.is_none()
            && self.description.is_none()
    }
}

impl Store {
    /// Creates a new store record
    pub async fn create(pool: &PgPool, data: CreateStoreData) -> Result<Self, sqlx::Error> {
        let store = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO stores (name, logo_url, store_type, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.logo_url)
        .bind(&data.store_type)
        .bind(&data.description)
        .fetch_one(pool)
        .await?;

        Ok(store)
    }

    /// Finds a store by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let store = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM stores WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(store)
    }

    /// Lists all stores, alphabetically
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let stores = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM stores ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(stores)
    }

    /// Applies a partial update, translating the provided fields into a
    /// single UPDATE statement. Returns the updated store, or `None` if the
    /// id does not resolve.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateStoreData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let fields = data.changes();
        if fields.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE stores SET ");
        let mut clauses = qb.separated(", ");
        for (column, value) in fields {
            clauses
                .push(column)
                .push_unseparated(" = ")
                .push_bind_unseparated(value);
        }
        clauses.push("updated_at = NOW()");
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING *");

        let store = qb.build_query_as::<Self>().fetch_optional(pool).await?;

        Ok(store)
    }

    /// Replaces the store's FAQ list
    pub async fn set_faq(
        pool: &PgPool,
        id: Uuid,
        faq: JsonValue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let store = sqlx::query_as::<_, Self>(
            r#"
            UPDATE stores SET faq = $2, updated_at = NOW() WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(faq)
        .fetch_optional(pool)
        .await?;

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_cover_only_provided_fields() {
        let data = UpdateStoreData {
            name: Some("Nike".to_string()),
            description: Some("Sportswear".to_string()),
            ..Default::default()
        };

        let fields = data.changes();
        let columns: Vec<&str> = fields.iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["name", "description"]);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateStoreData::default().is_empty());
        assert!(!UpdateStoreData {
            name: Some("Nike".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
