mod catalog;
mod types;

pub use catalog::{RecipeCatalog, SqliteRecipeCatalog};
pub use types::{Ingredient, Recipe, RecipeFilter, RecipeItem};
