use crate::config::Config;
use angi_mealplan::{MealPlanStore, SqliteMealPlanStore};
use angi_menu::{CandidatePicker, MenuComposer};
use angi_pricing::{
    AiEstimateSource, MarketScrapeSource, PriceCache, PriceRefresher, PriceSource,
    RefresherSettings, SqlitePriceCache,
};
use angi_recipe::{RecipeCatalog, SqliteRecipeCatalog};
use angi_shopping::ShoppingListBuilder;
use angi_user::SqlitePreferenceStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Wired-up services over one database pool. The thin CLI layer drives
/// these; all domain behavior lives in the member crates.
pub struct AppState {
    pub catalog: Arc<dyn RecipeCatalog>,
    pub plans: Arc<dyn MealPlanStore>,
    pub refresher: Arc<PriceRefresher>,
    pub composer: MenuComposer,
    pub shopping: ShoppingListBuilder,
}

impl AppState {
    pub fn new(config: &Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let catalog: Arc<dyn RecipeCatalog> = Arc::new(SqliteRecipeCatalog::new(pool.clone()));
        let cache: Arc<dyn PriceCache> = Arc::new(SqlitePriceCache::new(pool.clone()));
        let preferences = Arc::new(SqlitePreferenceStore::new(pool.clone()));
        let plans: Arc<dyn MealPlanStore> = Arc::new(SqliteMealPlanStore::new(pool));

        let lookup_timeout = Duration::from_millis(config.pricing.lookup_timeout_ms);

        // ordered chain: the scrape sidecar answers first, the AI
        // estimator only sees what it missed
        let mut sources: Vec<Arc<dyn PriceSource>> = Vec::new();
        if !config.sources.market_url.is_empty() {
            sources.push(Arc::new(MarketScrapeSource::new(
                &config.sources.market_url,
                lookup_timeout,
            )?));
        }
        if !config.sources.ai_url.is_empty() {
            sources.push(Arc::new(AiEstimateSource::new(
                &config.sources.ai_url,
                &config.sources.ai_model,
                lookup_timeout,
            )?));
        }

        let refresher = Arc::new(PriceRefresher::new(
            cache.clone(),
            sources,
            RefresherSettings {
                currency: config.pricing.currency.clone(),
                lookup_timeout,
                rate_limit: Duration::from_millis(config.pricing.rate_limit_ms),
            },
        ));

        let composer = MenuComposer::new(
            CandidatePicker::new(catalog.clone(), config.menu.scan_limit),
            preferences,
            plans.clone(),
            catalog.clone(),
        );

        let shopping = ShoppingListBuilder::new(
            catalog.clone(),
            cache,
            refresher.clone(),
            plans.clone(),
        );

        Ok(Self {
            catalog,
            plans,
            refresher,
            composer,
            shopping,
        })
    }
}
