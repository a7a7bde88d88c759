mod error;
mod normalize;
mod refresher;
mod scheduler;
mod source;
mod store;

pub use error::PricingError;
pub use normalize::{NormalizedPrice, canonical_unit, normalize};
pub use refresher::{PriceRefresher, RefreshReport, RefresherSettings};
pub use scheduler::refresh_scheduler;
pub use source::{AiEstimateSource, MarketScrapeSource, PriceSource, RawPrice};
pub use store::{PriceCache, SqlitePriceCache};
