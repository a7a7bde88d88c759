#![allow(dead_code)]

use angi_mealplan::{MealPlanStore, SqliteMealPlanStore};
use angi_menu::{CandidatePicker, MenuComposer};
use angi_pricing::{
    PriceCache, PriceRefresher, PriceSource, RawPrice, RefresherSettings, SqlitePriceCache,
};
use angi_recipe::{RecipeCatalog, SqliteRecipeCatalog};
use angi_user::SqlitePreferenceStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fresh in-memory database with the real schema. A single connection
/// keeps the in-memory database alive and shared.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

/// All services wired over one pool, with the price-source chain swapped
/// for scripted fakes.
pub struct TestState {
    pub pool: SqlitePool,
    pub cache: Arc<dyn PriceCache>,
    pub plans: Arc<dyn MealPlanStore>,
    pub refresher: Arc<PriceRefresher>,
    pub composer: MenuComposer,
    pub shopping: angi_shopping::ShoppingListBuilder,
}

pub fn wire(pool: SqlitePool, sources: Vec<Arc<dyn PriceSource>>) -> TestState {
    let catalog: Arc<dyn RecipeCatalog> = Arc::new(SqliteRecipeCatalog::new(pool.clone()));
    let cache: Arc<dyn PriceCache> = Arc::new(SqlitePriceCache::new(pool.clone()));
    let preferences = Arc::new(SqlitePreferenceStore::new(pool.clone()));
    let plans: Arc<dyn MealPlanStore> = Arc::new(SqliteMealPlanStore::new(pool.clone()));

    let refresher = Arc::new(PriceRefresher::new(
        cache.clone(),
        sources,
        RefresherSettings {
            currency: "VND".to_string(),
            lookup_timeout: Duration::from_secs(1),
            rate_limit: Duration::from_millis(0),
        },
    ));

    let composer = MenuComposer::new(
        CandidatePicker::new(catalog.clone(), 100),
        preferences,
        plans.clone(),
        catalog.clone(),
    );

    let shopping =
        angi_shopping::ShoppingListBuilder::new(catalog, cache.clone(), refresher.clone(), plans.clone());

    TestState {
        pool,
        cache,
        plans,
        refresher,
        composer,
        shopping,
    }
}

/// Answers with a scripted price text per ingredient name; anything not
/// scripted is a clean miss. Counts lookups.
pub struct ScriptedSource {
    prices: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(prices: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            prices: prices
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_raw(&self, ingredient_name: &str, _unit: &str) -> anyhow::Result<Option<RawPrice>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prices.get(ingredient_name).map(|text| RawPrice {
            text: text.clone(),
            unit: None,
        }))
    }
}

/// Always errors, counting attempts.
pub struct FailingSource {
    calls: AtomicUsize,
}

impl FailingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_raw(&self, _name: &str, _unit: &str) -> anyhow::Result<Option<RawPrice>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("connection refused"))
    }
}

const SEED_CREATED_AT: &str = "2024-01-01T00:00:00+00:00";

pub async fn insert_recipe(
    pool: &SqlitePool,
    id: &str,
    title: &str,
    tags: &[&str],
    cook_time_minutes: Option<i64>,
    kcal: Option<f64>,
    likes: i64,
) {
    sqlx::query(
        r#"
        INSERT INTO recipes (id, title, tags, region, cook_time_minutes, kcal, likes, created_at)
        VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(serde_json::to_string(tags).unwrap())
    .bind(cook_time_minutes)
    .bind(kcal)
    .bind(likes)
    .bind(SEED_CREATED_AT)
    .execute(pool)
    .await
    .expect("insert recipe");
}

pub async fn insert_ingredient(pool: &SqlitePool, id: &str, name: &str, unit: &str) {
    sqlx::query("INSERT INTO ingredients (id, name, unit) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(name)
        .bind(unit)
        .execute(pool)
        .await
        .expect("insert ingredient");
}

pub async fn set_price(
    pool: &SqlitePool,
    id: &str,
    price_per_unit: f64,
    updated_at: DateTime<Utc>,
) {
    sqlx::query(
        r#"
        UPDATE ingredients
        SET price_per_unit = ?1, price_currency = 'VND', price_updated_at = ?2, last_checked_at = ?2
        WHERE id = ?3
        "#,
    )
    .bind(price_per_unit)
    .bind(updated_at.to_rfc3339())
    .bind(id)
    .execute(pool)
    .await
    .expect("set price");
}

pub async fn set_last_checked(pool: &SqlitePool, id: &str, at: DateTime<Utc>) {
    sqlx::query("UPDATE ingredients SET last_checked_at = ?1 WHERE id = ?2")
        .bind(at.to_rfc3339())
        .bind(id)
        .execute(pool)
        .await
        .expect("set last_checked_at");
}

pub async fn insert_item(
    pool: &SqlitePool,
    recipe_id: &str,
    ingredient_id: &str,
    amount: f64,
    unit_override: Option<&str>,
) {
    sqlx::query(
        r#"
        INSERT INTO recipe_items (recipe_id, ingredient_id, amount, unit_override)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(amount)
    .bind(unit_override)
    .execute(pool)
    .await
    .expect("insert recipe item");
}

pub async fn insert_preference(
    pool: &SqlitePool,
    user_id: &str,
    daily_kcal_target: Option<f64>,
    diet_type: &str,
    disliked: &[&str],
    liked: &[&str],
) {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, daily_kcal_target, diet_type, disliked_ingredients, liked_tags)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(user_id)
    .bind(daily_kcal_target)
    .bind(diet_type)
    .bind(serde_json::to_string(disliked).unwrap())
    .bind(serde_json::to_string(liked).unwrap())
    .execute(pool)
    .await
    .expect("insert preference");
}
