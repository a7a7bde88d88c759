use crate::error::MenuError;
use angi_recipe::{Recipe, RecipeCatalog, RecipeFilter};
use std::sync::Arc;

/// Constraint set for one candidate pool.
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    /// Tag-OR intersection: a recipe qualifies when any of its tags is in
    /// this set.
    pub must_tags: Vec<String>,
    /// Case-insensitive substrings that disqualify a recipe by title.
    pub avoid_names: Vec<String>,
    /// Widens the accepted tag set with meatless tags.
    pub vegetarian: bool,
    /// Added to the accepted tag set, never a hard equality filter.
    pub region: Option<String>,
    pub limit: usize,
}

/// Builds ranked, bounded candidate pools from the catalog.
///
/// The catalog scan is bounded by `scan_limit` before exclusion filtering,
/// keeping query cost flat; the survivors are truncated again to the
/// query's own limit.
pub struct CandidatePicker {
    catalog: Arc<dyn RecipeCatalog>,
    scan_limit: u32,
}

const MEATLESS_TAGS: [&str; 2] = ["Vegan", "Veggie"];

impl CandidatePicker {
    pub fn new(catalog: Arc<dyn RecipeCatalog>, scan_limit: u32) -> Self {
        Self {
            catalog,
            scan_limit,
        }
    }

    pub async fn pick(&self, query: &CandidateQuery) -> Result<Vec<Recipe>, MenuError> {
        let mut tags = query.must_tags.clone();
        if query.vegetarian {
            for tag in MEATLESS_TAGS {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            }
        }
        if let Some(region) = &query.region {
            if !tags.contains(region) {
                tags.push(region.clone());
            }
        }

        let scanned = self
            .catalog
            .find_recipes(&RecipeFilter {
                any_tags: tags,
                limit: self.scan_limit,
            })
            .await?;

        let avoid: Vec<String> = query
            .avoid_names
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        let mut picked: Vec<Recipe> = scanned
            .into_iter()
            .filter(|recipe| {
                let title = recipe.title.to_lowercase();
                !avoid.iter().any(|name| title.contains(name.as_str()))
            })
            .collect();
        picked.truncate(query.limit);

        Ok(picked)
    }
}
