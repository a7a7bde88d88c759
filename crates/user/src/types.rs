use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Diet preference. Unknown stored values fall back to `None` rather than
/// failing the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DietType {
    None,
    Vegetarian,
    Vegan,
}

impl DietType {
    pub fn parse_lossy(raw: &str) -> Self {
        raw.trim().to_lowercase().parse().unwrap_or(DietType::None)
    }
}

/// Per-user planning preferences. Read-only input to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: String,
    pub daily_kcal_target: Option<f64>,
    pub diet_type: DietType,
    /// Ingredient names the user never wants to see in a dish title.
    pub disliked_ingredients: Vec<String>,
    /// Preferred tags; may include region codes.
    pub liked_tags: Vec<String>,
}

impl UserPreference {
    /// Both vegetarian and vegan preferences widen candidate pools with
    /// meatless tags.
    pub fn wants_meatless(&self) -> bool {
        matches!(self.diet_type, DietType::Vegetarian | DietType::Vegan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lossy_accepts_known_values() {
        assert_eq!(DietType::parse_lossy("vegan"), DietType::Vegan);
        assert_eq!(DietType::parse_lossy(" Vegetarian "), DietType::Vegetarian);
        assert_eq!(DietType::parse_lossy("none"), DietType::None);
    }

    #[test]
    fn parse_lossy_defaults_unknown_to_none() {
        assert_eq!(DietType::parse_lossy("keto"), DietType::None);
        assert_eq!(DietType::parse_lossy(""), DietType::None);
    }

    #[test]
    fn meatless_covers_vegetarian_and_vegan() {
        let mut pref = UserPreference {
            user_id: "u1".to_string(),
            daily_kcal_target: None,
            diet_type: DietType::Vegan,
            disliked_ingredients: vec![],
            liked_tags: vec![],
        };
        assert!(pref.wants_meatless());

        pref.diet_type = DietType::Vegetarian;
        assert!(pref.wants_meatless());

        pref.diet_type = DietType::None;
        assert!(!pref.wants_meatless());
    }
}
