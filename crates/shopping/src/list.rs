use crate::error::ShoppingError;
use angi_mealplan::MealPlanStore;
use angi_pricing::{PriceCache, PriceRefresher};
use angi_recipe::{Ingredient, RecipeCatalog, RecipeItem};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One line of a shopping list. Price fields are present only when the
/// cache knows a price — never defaulted to zero.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingListItem {
    pub ingredient_id: String,
    pub name: String,
    pub unit: String,
    pub qty: f64,
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_updated_at: Option<DateTime<Utc>>,
}

/// Merges ingredient quantities across recipes and prices the result from
/// the cache. Prices are best effort: the list always comes back, priced
/// or not.
pub struct ShoppingListBuilder {
    catalog: Arc<dyn RecipeCatalog>,
    cache: Arc<dyn PriceCache>,
    refresher: Arc<PriceRefresher>,
    plans: Arc<dyn MealPlanStore>,
}

impl ShoppingListBuilder {
    pub fn new(
        catalog: Arc<dyn RecipeCatalog>,
        cache: Arc<dyn PriceCache>,
        refresher: Arc<PriceRefresher>,
        plans: Arc<dyn MealPlanStore>,
    ) -> Self {
        Self {
            catalog,
            cache,
            refresher,
            plans,
        }
    }

    /// Aggregate an explicit recipe list into priced shopping lines.
    pub async fn for_recipes(
        &self,
        recipe_ids: &[String],
    ) -> Result<Vec<ShoppingListItem>, ShoppingError> {
        let unique = dedup_ordered(recipe_ids);
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let known = self.catalog.count_by_ids(&unique).await?;
        if (known as usize) != unique.len() {
            return Err(ShoppingError::UnknownRecipes {
                requested: unique.len(),
                missing: unique.len() - known as usize,
            });
        }

        let items = self.catalog.items_for_recipes(&unique).await?;
        let ingredient_ids: Vec<String> =
            dedup_ordered(&items.iter().map(|i| i.ingredient_id.clone()).collect::<Vec<_>>());

        // Best effort: a failed refresh still leaves whatever prices are
        // already cached, and the list goes out regardless.
        if let Err(err) = self.refresher.ensure_fresh_prices(&ingredient_ids).await {
            tracing::warn!(err = %err, "price refresh unavailable, using cached prices");
        }

        let ingredients = self.cache.ingredients_by_ids(&ingredient_ids).await?;

        Ok(build_lines(&items, &ingredients))
    }

    /// Aggregate every recipe planned in `[start, end]` for the user,
    /// deduplicated across days and slots.
    pub async fn for_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ShoppingListItem>, ShoppingError> {
        let plans = self.plans.plans_in_range(user_id, start, end).await?;

        let mut recipe_ids: Vec<String> = Vec::new();
        for plan in &plans {
            for id in plan.slots.all_recipe_ids() {
                if !recipe_ids.contains(&id) {
                    recipe_ids.push(id);
                }
            }
        }

        self.for_recipes(&recipe_ids).await
    }
}

/// Pure aggregation step: sum quantities per ingredient id, resolve the
/// display unit (per-item override beats the stored default), then attach
/// cached prices. Output is sorted by ingredient name.
fn build_lines(items: &[RecipeItem], ingredients: &[Ingredient]) -> Vec<ShoppingListItem> {
    let by_id: HashMap<&str, &Ingredient> =
        ingredients.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut lines: HashMap<String, ShoppingListItem> = HashMap::new();

    for item in items {
        let Some(ingredient) = by_id.get(item.ingredient_id.as_str()) else {
            tracing::warn!(
                ingredient_id = %item.ingredient_id,
                recipe_id = %item.recipe_id,
                "recipe item references an ingredient missing from the cache"
            );
            continue;
        };

        let line = lines
            .entry(item.ingredient_id.clone())
            .or_insert_with(|| ShoppingListItem {
                ingredient_id: ingredient.id.clone(),
                name: ingredient.name.clone(),
                unit: item
                    .unit_override
                    .clone()
                    .unwrap_or_else(|| ingredient.unit.clone()),
                qty: 0.0,
                checked: false,
                unit_price: None,
                currency: None,
                estimated_cost: None,
                price_updated_at: None,
            });
        line.qty += item.amount;
    }

    let mut priced: Vec<ShoppingListItem> = lines
        .into_values()
        .map(|mut line| {
            if let Some(ingredient) = by_id.get(line.ingredient_id.as_str()) {
                if let Some(unit_price) = ingredient.price_per_unit {
                    line.unit_price = Some(unit_price);
                    line.currency = ingredient.price_currency.clone();
                    line.estimated_cost = Some(round2(unit_price * line.qty));
                    line.price_updated_at = ingredient.price_updated_at;
                }
            }
            line
        })
        .collect();

    priced.sort_by(|a, b| a.name.cmp(&b.name));
    priced
}

fn dedup_ordered(ids: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
