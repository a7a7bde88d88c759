mod copy;
mod error;
mod store;
mod types;
mod week;

pub use copy::{WeekCopy, copy_week};
pub use error::MealPlanError;
pub use store::{MealPlanStore, SqliteMealPlanStore};
pub use types::{MealPlan, SlotName, SlotTarget, Slots};
pub use week::{WeekWindow, monday_of, week_of};
