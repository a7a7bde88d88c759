use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("price source '{name}' failed")]
    Source {
        name: String,
        #[source]
        cause: anyhow::Error,
    },

    #[error("price lookup for '{0}' timed out")]
    Timeout(String),

    #[error("price cache error")]
    Cache(#[source] anyhow::Error),
}
