use angi_recipe::Ingredient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;

/// Storage side of the price cache. Writes are idempotent
/// last-writer-wins; a stale overwrite only affects freshness, never
/// correctness.
#[async_trait]
pub trait PriceCache: Send + Sync {
    async fn all_ingredients(&self) -> anyhow::Result<Vec<Ingredient>>;

    async fn ingredients_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Ingredient>>;

    /// Record a found price: sets the price, currency, and both the price
    /// and freshness stamps.
    async fn update_price(
        &self,
        id: &str,
        price_per_unit: f64,
        currency: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Record a completed check that found nothing: moves only the
    /// freshness stamp, the existing price stays untouched.
    async fn mark_checked(&self, id: &str, at: DateTime<Utc>) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SqlitePriceCache {
    pool: SqlitePool,
}

impl SqlitePriceCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct IngredientRow {
    id: String,
    name: String,
    unit: String,
    price_per_unit: Option<f64>,
    price_currency: Option<String>,
    price_updated_at: Option<String>,
    last_checked_at: Option<String>,
}

impl IngredientRow {
    fn into_ingredient(self) -> anyhow::Result<Ingredient> {
        Ok(Ingredient {
            id: self.id,
            name: self.name,
            unit: self.unit,
            price_per_unit: self.price_per_unit,
            price_currency: self.price_currency,
            price_updated_at: self
                .price_updated_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            last_checked_at: self
                .last_checked_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

const INGREDIENT_COLUMNS: &str =
    "id, name, unit, price_per_unit, price_currency, price_updated_at, last_checked_at";

#[async_trait]
impl PriceCache for SqlitePriceCache {
    async fn all_ingredients(&self) -> anyhow::Result<Vec<Ingredient>> {
        let sql = format!(
            r#"
            SELECT {INGREDIENT_COLUMNS}
            FROM ingredients
            ORDER BY name
            "#
        );

        let rows = sqlx::query_as::<_, IngredientRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(IngredientRow::into_ingredient).collect()
    }

    async fn ingredients_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Ingredient>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = std::iter::repeat_n("?", ids.len())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT {INGREDIENT_COLUMNS}
            FROM ingredients
            WHERE id IN ({placeholders})
            ORDER BY name
            "#
        );

        let mut query = sqlx::query_as::<_, IngredientRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(IngredientRow::into_ingredient).collect()
    }

    async fn update_price(
        &self,
        id: &str,
        price_per_unit: f64,
        currency: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE ingredients
            SET price_per_unit = ?1,
                price_currency = ?2,
                price_updated_at = ?3,
                last_checked_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(price_per_unit)
        .bind(currency)
        .bind(at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_checked(&self, id: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE ingredients
            SET last_checked_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
