use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

/// A named meal period within one day's plan.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    Breakfast,
    Lunch,
    Dinner,
}

/// Persistence target for a composed menu: one slot, or the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    All,
    One(SlotName),
}

impl fmt::Display for SlotTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotTarget::All => write!(f, "all"),
            SlotTarget::One(slot) => write!(f, "{slot}"),
        }
    }
}

impl FromStr for SlotTarget {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().to_lowercase();
        if raw == "all" {
            return Ok(SlotTarget::All);
        }
        SlotName::from_str(&raw)
            .map(SlotTarget::One)
            .map_err(|_| format!("unknown slot '{raw}', expected all/breakfast/lunch/dinner"))
    }
}

/// The day's slot map: exactly three named, optional, ordered recipe-id
/// lists. `None` means the slot was never written; an empty list means it
/// was explicitly cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<Vec<String>>,
}

impl Slots {
    pub fn get(&self, slot: SlotName) -> Option<&[String]> {
        match slot {
            SlotName::Breakfast => self.breakfast.as_deref(),
            SlotName::Lunch => self.lunch.as_deref(),
            SlotName::Dinner => self.dinner.as_deref(),
        }
    }

    pub fn set(&mut self, slot: SlotName, recipe_ids: Vec<String>) {
        match slot {
            SlotName::Breakfast => self.breakfast = Some(recipe_ids),
            SlotName::Lunch => self.lunch = Some(recipe_ids),
            SlotName::Dinner => self.dinner = Some(recipe_ids),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.breakfast.is_none() && self.lunch.is_none() && self.dinner.is_none()
    }

    /// All referenced recipe ids in slot order, first occurrence kept.
    pub fn all_recipe_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for slot in [SlotName::Breakfast, SlotName::Lunch, SlotName::Dinner] {
            if let Some(ids) = self.get(slot) {
                for id in ids {
                    if !seen.contains(id) {
                        seen.push(id.clone());
                    }
                }
            }
        }
        seen
    }
}

/// One user's plan for one calendar day. Unique per (user_id, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub slots: Slots,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MealPlan {
    pub fn new(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            date,
            slots: Slots::default(),
            note: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}
