use crate::types::{Recipe, RecipeFilter, RecipeItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;

/// Read-only view of the recipe catalog.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn find_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>>;

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Recipe>>;

    /// Number of the given ids that exist in the catalog. Used to validate
    /// slot writes without fetching full rows.
    async fn count_by_ids(&self, ids: &[String]) -> anyhow::Result<u64>;

    async fn items_for_recipes(&self, recipe_ids: &[String]) -> anyhow::Result<Vec<RecipeItem>>;
}

/// SQLite-backed catalog. Tags are stored as a JSON array column and
/// queried through `json_each`.
#[derive(Clone)]
pub struct SqliteRecipeCatalog {
    pool: SqlitePool,
}

impl SqliteRecipeCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RecipeRow {
    id: String,
    title: String,
    tags: String,
    region: Option<String>,
    cook_time_minutes: Option<i64>,
    kcal: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
    carbs: Option<f64>,
    likes: i64,
    created_at: String,
}

const RECIPE_COLUMNS: &str =
    "id, title, tags, region, cook_time_minutes, kcal, protein, fat, carbs, likes, created_at";

impl RecipeRow {
    fn into_recipe(self) -> anyhow::Result<Recipe> {
        Ok(Recipe {
            id: self.id,
            title: self.title,
            tags: serde_json::from_str(&self.tags)?,
            region: self.region,
            cook_time_minutes: self.cook_time_minutes.map(|m| m as u32),
            kcal: self.kcal,
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbs,
            likes: self.likes,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn placeholders(count: usize) -> String {
    std::iter::repeat_n("?", count).collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl RecipeCatalog for SqliteRecipeCatalog {
    async fn find_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
        let sql = if filter.any_tags.is_empty() {
            format!(
                r#"
                SELECT {RECIPE_COLUMNS}
                FROM recipes
                ORDER BY likes DESC, created_at DESC
                LIMIT ?
                "#
            )
        } else {
            format!(
                r#"
                SELECT {RECIPE_COLUMNS}
                FROM recipes
                WHERE EXISTS (
                    SELECT 1 FROM json_each(recipes.tags)
                    WHERE json_each.value IN ({})
                )
                ORDER BY likes DESC, created_at DESC
                LIMIT ?
                "#,
                placeholders(filter.any_tags.len())
            )
        };

        let mut query = sqlx::query_as::<_, RecipeRow>(&sql);
        for tag in &filter.any_tags {
            query = query.bind(tag);
        }
        query = query.bind(filter.limit as i64);

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(RecipeRow::into_recipe).collect()
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Recipe>> {
        let sql = format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE id = ?1
            "#
        );

        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(RecipeRow::into_recipe).transpose()
    }

    async fn count_by_ids(&self, ids: &[String]) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(DISTINCT id) FROM recipes WHERE id IN ({})",
            placeholders(ids.len())
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_one(&self.pool).await? as u64)
    }

    async fn items_for_recipes(&self, recipe_ids: &[String]) -> anyhow::Result<Vec<RecipeItem>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT recipe_id, ingredient_id, amount, unit_override
            FROM recipe_items
            WHERE recipe_id IN ({})
            ORDER BY recipe_id, ingredient_id
            "#,
            placeholders(recipe_ids.len())
        );

        let mut query = sqlx::query_as::<_, ItemRow>(&sql);
        for id in recipe_ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| RecipeItem {
                recipe_id: row.recipe_id,
                ingredient_id: row.ingredient_id,
                amount: row.amount,
                unit_override: row.unit_override,
            })
            .collect())
    }
}

#[derive(FromRow)]
struct ItemRow {
    recipe_id: String,
    ingredient_id: String,
    amount: f64,
    unit_override: Option<String>,
}
