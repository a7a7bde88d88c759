use crate::types::{DietType, UserPreference};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;

/// Read access to the user preference store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn preference_for(&self, user_id: &str) -> anyhow::Result<Option<UserPreference>>;
}

#[derive(Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
}

impl SqlitePreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PreferenceRow {
    user_id: String,
    daily_kcal_target: Option<f64>,
    diet_type: Option<String>,
    disliked_ingredients: String,
    liked_tags: String,
}

impl PreferenceRow {
    fn into_preference(self) -> anyhow::Result<UserPreference> {
        Ok(UserPreference {
            user_id: self.user_id,
            daily_kcal_target: self.daily_kcal_target,
            diet_type: self
                .diet_type
                .as_deref()
                .map(DietType::parse_lossy)
                .unwrap_or(DietType::None),
            disliked_ingredients: serde_json::from_str(&self.disliked_ingredients)?,
            liked_tags: serde_json::from_str(&self.liked_tags)?,
        })
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn preference_for(&self, user_id: &str) -> anyhow::Result<Option<UserPreference>> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT user_id, daily_kcal_target, diet_type, disliked_ingredients, liked_tags
            FROM user_preferences
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PreferenceRow::into_preference).transpose()
    }
}
