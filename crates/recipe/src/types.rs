use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dish from the catalog. Read-only to the planning core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    /// Free-form labels: category ("Main", "Soup"), diet ("Vegan"), region codes.
    pub tags: Vec<String>,
    pub region: Option<String>,
    pub cook_time_minutes: Option<u32>,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Exact-match tag membership against any of `wanted`.
    pub fn has_any_tag(&self, wanted: &[&str]) -> bool {
        self.tags.iter().any(|t| wanted.contains(&t.as_str()))
    }
}

/// An ingredient record. The price fields belong to the price cache and are
/// only written by the refresher or the on-demand throttle.
///
/// `price_per_unit` is always expressed in the normalized base unit (g, ml,
/// or an atomic packaged unit such as "chai"/"gói"). `last_checked_at`
/// records the most recent refresh attempt whether or not it found a price;
/// `price_updated_at` only moves when a price was actually written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub price_per_unit: Option<f64>,
    pub price_currency: Option<String>,
    pub price_updated_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Links a recipe to one ingredient and the amount it consumes. The amount
/// is in the ingredient's unit unless `unit_override` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeItem {
    pub recipe_id: String,
    pub ingredient_id: String,
    pub amount: f64,
    pub unit_override: Option<String>,
}

/// Catalog query: recipes whose tag set intersects `any_tags` (OR
/// semantics; an empty list matches everything), ranked by likes descending
/// with created_at descending as tie-break, truncated to `limit`.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub any_tags: Vec<String>,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with_tags(tags: Vec<&str>) -> Recipe {
        Recipe {
            id: "r1".to_string(),
            title: "Canh chua cá".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            region: None,
            cook_time_minutes: Some(30),
            kcal: None,
            protein: None,
            fat: None,
            carbs: None,
            likes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn has_any_tag_matches_exactly() {
        let recipe = recipe_with_tags(vec!["Soup", "Veggie"]);

        assert!(recipe.has_any_tag(&["Soup"]));
        assert!(recipe.has_any_tag(&["Dessert", "Veggie"]));
        assert!(!recipe.has_any_tag(&["soup"]));
        assert!(!recipe.has_any_tag(&[]));
    }
}
