mod store;
mod types;

pub use store::{PreferenceStore, SqlitePreferenceStore};
pub use types::{DietType, UserPreference};
