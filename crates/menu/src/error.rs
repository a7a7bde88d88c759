use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("{missing} of {requested} selected recipes are missing from the catalog")]
    UnknownRecipes { requested: usize, missing: usize },

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}
