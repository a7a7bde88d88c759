use crate::candidates::{CandidatePicker, CandidateQuery};
use crate::error::MenuError;
use angi_mealplan::{MealPlanStore, SlotName, SlotTarget};
use angi_recipe::{Recipe, RecipeCatalog};
use angi_user::{PreferenceStore, UserPreference};
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// A menu-composition category: a tag group and the number of dishes it
/// contributes. Blocks exist only during suggestion, they are never
/// persisted.
struct Block {
    name: &'static str,
    tags: &'static [&'static str],
    count: usize,
}

const MAIN: Block = Block {
    name: "main",
    tags: &["Main"],
    count: 1,
};
const SOUP: Block = Block {
    name: "soup",
    tags: &["Soup"],
    count: 1,
};
const VEGETABLE: Block = Block {
    name: "vegetable",
    tags: &["Veggie", "Vegetable"],
    count: 1,
};
const STARTER: Block = Block {
    name: "starter",
    tags: &["Starter", "Salad"],
    count: 1,
};
const DESSERT: Block = Block {
    name: "dessert",
    tags: &["Dessert"],
    count: 1,
};

/// Dishes considered light enough for the breakfast slot.
const LIGHT_TAGS: [&str; 3] = ["Veggie", "Soup", "Salad"];
const LIGHT_BREAKFAST_CAP: usize = 3;

/// When a recipe does not declare a cook time, budget checks assume this.
const DEFAULT_COOK_MINUTES: u32 = 30;

#[derive(Debug, Clone)]
pub struct MenuOptions {
    pub include_starter: bool,
    pub include_dessert: bool,
    /// Budget over the summed cook time of the selected dishes.
    pub max_total_cook_minutes: Option<u32>,
    pub region: Option<String>,
    /// Candidate pool size per block.
    pub pool_limit: usize,
    /// Write the composed menu into the day's meal plan.
    pub persist: bool,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            include_starter: false,
            include_dessert: false,
            max_total_cook_minutes: None,
            region: None,
            pool_limit: 20,
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuSuggestion {
    pub date: NaiveDate,
    pub slot: String,
    pub dishes: Vec<Recipe>,
}

#[derive(Debug, Clone)]
pub struct MealSuggestionOptions {
    pub limit: usize,
}

impl Default for MealSuggestionOptions {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

/// Flat, preference-driven suggestion result. `message` is always
/// non-empty when `recipes` is — an empty catalog is an answer, not an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct MealSuggestion {
    pub recipes: Vec<Recipe>,
    pub message: String,
}

/// Composes balanced menus from per-block candidate pools and optionally
/// persists them into meal-plan slots.
pub struct MenuComposer {
    picker: CandidatePicker,
    preferences: Arc<dyn PreferenceStore>,
    plans: Arc<dyn MealPlanStore>,
    catalog: Arc<dyn RecipeCatalog>,
}

impl MenuComposer {
    pub fn new(
        picker: CandidatePicker,
        preferences: Arc<dyn PreferenceStore>,
        plans: Arc<dyn MealPlanStore>,
        catalog: Arc<dyn RecipeCatalog>,
    ) -> Self {
        Self {
            picker,
            preferences,
            plans,
            catalog,
        }
    }

    /// Compose a dish set for `date`: one main, one soup, one vegetable,
    /// plus starter/dessert on request. Selection within each block is a
    /// uniform draw (Fisher–Yates over the pool, first N taken); no recipe
    /// id appears twice across the whole menu.
    pub async fn suggest_menu<R: Rng>(
        &self,
        user_id: &str,
        date: NaiveDate,
        target: SlotTarget,
        options: &MenuOptions,
        rng: &mut R,
    ) -> Result<MenuSuggestion, MenuError> {
        let preference = self.preferences.preference_for(user_id).await?;
        let vegetarian = preference
            .as_ref()
            .map(UserPreference::wants_meatless)
            .unwrap_or(false);
        let avoid_names = preference
            .map(|p| p.disliked_ingredients)
            .unwrap_or_default();

        let mut dishes: Vec<Recipe> = Vec::new();
        let mut dessert_ids: Vec<String> = Vec::new();

        for block in blocks_for(options) {
            let mut pool = self
                .picker
                .pick(&CandidateQuery {
                    must_tags: block.tags.iter().map(|t| t.to_string()).collect(),
                    avoid_names: avoid_names.clone(),
                    vegetarian,
                    region: options.region.clone(),
                    limit: options.pool_limit,
                })
                .await?;
            pool.retain(|candidate| !dishes.iter().any(|d| d.id == candidate.id));

            fisher_yates(&mut pool, rng);

            for recipe in pool.into_iter().take(block.count) {
                if block.name == DESSERT.name {
                    dessert_ids.push(recipe.id.clone());
                }
                dishes.push(recipe);
            }
        }

        // Over the cook-time budget the dessert goes — one remediation
        // step, no re-search for faster substitutes.
        if let Some(budget) = options.max_total_cook_minutes {
            if total_cook_minutes(&dishes) > budget && !dessert_ids.is_empty() {
                dishes.retain(|d| !dessert_ids.contains(&d.id));
                tracing::debug!(user_id, %date, "dropped dessert to fit cook-time budget");
            }
        }

        if options.persist {
            self.persist(user_id, date, target, &dishes).await?;
        }

        Ok(MenuSuggestion {
            date,
            slot: target.to_string(),
            dishes,
        })
    }

    /// Preference-driven flat suggestion: liked tags feed the pool, the
    /// diet widens it, disliked names are excluded, and a daily kcal
    /// target bounds each dish at a third of the day.
    pub async fn suggest_meals(
        &self,
        user_id: &str,
        options: &MealSuggestionOptions,
    ) -> Result<MealSuggestion, MenuError> {
        let preference = self.preferences.preference_for(user_id).await?;

        let (must_tags, avoid_names, vegetarian, kcal_cap) = match &preference {
            Some(p) => (
                p.liked_tags.clone(),
                p.disliked_ingredients.clone(),
                p.wants_meatless(),
                p.daily_kcal_target.map(|target| target / 3.0),
            ),
            None => (Vec::new(), Vec::new(), false, None),
        };

        let mut recipes = self
            .picker
            .pick(&CandidateQuery {
                must_tags,
                avoid_names,
                vegetarian,
                region: None,
                limit: options.limit * 2,
            })
            .await?;

        if let Some(cap) = kcal_cap {
            recipes.retain(|r| r.kcal.map(|kcal| kcal <= cap).unwrap_or(true));
        }
        recipes.truncate(options.limit);

        let message = if recipes.is_empty() {
            "No dishes matched your preferences. Try relaxing your diet type or disliked \
             ingredients."
                .to_string()
        } else {
            format!("{} dishes matched your preferences", recipes.len())
        };

        Ok(MealSuggestion { recipes, message })
    }

    /// Write the dish set into the day's plan. Slot "all" fills lunch and
    /// dinner with the full set and breakfast with a light subset; a
    /// specific slot only touches itself. Recipe ids are validated against
    /// the catalog before anything is written.
    async fn persist(
        &self,
        user_id: &str,
        date: NaiveDate,
        target: SlotTarget,
        dishes: &[Recipe],
    ) -> Result<(), MenuError> {
        let ids: Vec<String> = dishes.iter().map(|d| d.id.clone()).collect();

        if !ids.is_empty() {
            let known = self.catalog.count_by_ids(&ids).await?;
            if (known as usize) != ids.len() {
                return Err(MenuError::UnknownRecipes {
                    requested: ids.len(),
                    missing: ids.len() - known as usize,
                });
            }
        }

        let patch: Vec<(SlotName, Vec<String>)> = match target {
            SlotTarget::All => vec![
                (SlotName::Breakfast, light_breakfast(dishes)),
                (SlotName::Lunch, ids.clone()),
                (SlotName::Dinner, ids),
            ],
            SlotTarget::One(slot) => vec![(slot, ids)],
        };

        self.plans.upsert_slots(user_id, date, &patch).await?;

        Ok(())
    }
}

fn blocks_for(options: &MenuOptions) -> Vec<&'static Block> {
    let mut blocks = vec![&MAIN, &SOUP, &VEGETABLE];
    if options.include_starter {
        blocks.push(&STARTER);
    }
    if options.include_dessert {
        blocks.push(&DESSERT);
    }
    blocks
}

fn total_cook_minutes(dishes: &[Recipe]) -> u32 {
    dishes
        .iter()
        .map(|d| d.cook_time_minutes.unwrap_or(DEFAULT_COOK_MINUTES))
        .sum()
}

/// The breakfast subset of a composed menu: light-tagged dishes capped at
/// three, or the first two dishes when none qualify.
fn light_breakfast(dishes: &[Recipe]) -> Vec<String> {
    let light: Vec<String> = dishes
        .iter()
        .filter(|d| d.has_any_tag(&LIGHT_TAGS))
        .take(LIGHT_BREAKFAST_CAP)
        .map(|d| d.id.clone())
        .collect();

    if light.is_empty() {
        dishes.iter().take(2).map(|d| d.id.clone()).collect()
    } else {
        light
    }
}

/// Uniform in-place permutation: swap from the last index down to 1.
fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
