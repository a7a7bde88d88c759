use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShoppingError {
    #[error("{missing} of {requested} requested recipes are missing from the catalog")]
    UnknownRecipes { requested: usize, missing: usize },

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}
