use thiserror::Error;

#[derive(Error, Debug)]
pub enum MealPlanError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("no meal plan for user {user_id} on {date}")]
    NotFound { user_id: String, date: String },

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}
