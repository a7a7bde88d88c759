use crate::error::PricingError;
use crate::normalize::{NormalizedPrice, normalize};
use crate::source::PriceSource;
use crate::store::PriceCache;
use angi_recipe::Ingredient;
use chrono::{DateTime, Local, LocalResult, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Outcome counters for a batch refresh: `updated` ingredients received a
/// fresh price, `unchecked_but_stamped` completed their check without one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RefreshReport {
    pub updated: u64,
    pub unchecked_but_stamped: u64,
}

#[derive(Debug, Clone)]
pub struct RefresherSettings {
    pub currency: String,
    /// Upper bound on a single external lookup; a hung call must not stall
    /// the whole batch.
    pub lookup_timeout: Duration,
    /// Politeness delay between consecutive external lookups.
    pub rate_limit: Duration,
}

impl Default for RefresherSettings {
    fn default() -> Self {
        Self {
            currency: "VND".to_string(),
            lookup_timeout: Duration::from_secs(10),
            rate_limit: Duration::from_millis(500),
        }
    }
}

/// Walks ingredients through the ordered source chain and writes refreshed
/// price records. Used both by the daily batch (`refresh_all`) and the
/// on-demand shopping-list path (`ensure_fresh_prices`).
pub struct PriceRefresher {
    cache: Arc<dyn PriceCache>,
    sources: Vec<Arc<dyn PriceSource>>,
    settings: RefresherSettings,
}

impl PriceRefresher {
    pub fn new(
        cache: Arc<dyn PriceCache>,
        sources: Vec<Arc<dyn PriceSource>>,
        settings: RefresherSettings,
    ) -> Self {
        Self {
            cache,
            sources,
            settings,
        }
    }

    /// Re-verify every ingredient's price, with no staleness pre-filter.
    ///
    /// A hit writes the price and both stamps; a miss — including a failed
    /// or timed-out lookup — stamps only `last_checked_at`, so throttled
    /// callers skip the ingredient for the rest of the day without a price
    /// ever being fabricated. One ingredient's failure never aborts the
    /// rest of the batch.
    pub async fn refresh_all(&self) -> Result<RefreshReport, PricingError> {
        let ingredients = self
            .cache
            .all_ingredients()
            .await
            .map_err(PricingError::Cache)?;

        tracing::info!(total = ingredients.len(), "starting price refresh");
        let mut report = RefreshReport::default();

        for (idx, ingredient) in ingredients.iter().enumerate() {
            if idx > 0 {
                sleep(self.settings.rate_limit).await;
            }

            let now = Utc::now();
            match self.lookup(&ingredient.name, &ingredient.unit).await {
                Ok(Some(price)) => {
                    self.cache
                        .update_price(
                            &ingredient.id,
                            price.price_per_unit,
                            &self.settings.currency,
                            now,
                        )
                        .await
                        .map_err(PricingError::Cache)?;
                    report.updated += 1;
                }
                Ok(None) => {
                    self.cache
                        .mark_checked(&ingredient.id, now)
                        .await
                        .map_err(PricingError::Cache)?;
                    report.unchecked_but_stamped += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        ingredient = %ingredient.name,
                        err = %err,
                        "price lookup failed, treating as miss"
                    );
                    self.cache
                        .mark_checked(&ingredient.id, now)
                        .await
                        .map_err(PricingError::Cache)?;
                    report.unchecked_but_stamped += 1;
                }
            }
        }

        tracing::info!(
            updated = report.updated,
            unchecked = report.unchecked_but_stamped,
            "price refresh finished"
        );

        Ok(report)
    }

    /// Refresh only the given ingredients, and only those not yet checked
    /// today (local calendar day) — at most one external lookup per
    /// ingredient per day, however many shopping lists are built.
    ///
    /// Unlike the daily batch, an external failure abandons the whole call
    /// without stamping the failed or remaining ingredients, so a later
    /// call may retry instead of being suppressed until tomorrow.
    pub async fn ensure_fresh_prices(&self, ids: &[String]) -> Result<(), PricingError> {
        if ids.is_empty() {
            return Ok(());
        }

        let ingredients = self
            .cache
            .ingredients_by_ids(ids)
            .await
            .map_err(PricingError::Cache)?;

        let pending = pending_ingredients(&ingredients, start_of_local_day());
        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(pending = pending.len(), "refreshing stale prices on demand");

        for (idx, ingredient) in pending.iter().enumerate() {
            if idx > 0 {
                sleep(self.settings.rate_limit).await;
            }

            let now = Utc::now();
            match self.lookup(&ingredient.name, &ingredient.unit).await? {
                Some(price) => {
                    self.cache
                        .update_price(
                            &ingredient.id,
                            price.price_per_unit,
                            &self.settings.currency,
                            now,
                        )
                        .await
                        .map_err(PricingError::Cache)?;
                }
                None => {
                    self.cache
                        .mark_checked(&ingredient.id, now)
                        .await
                        .map_err(PricingError::Cache)?;
                }
            }
        }

        Ok(())
    }

    /// Try the source chain in order until one yields a normalizable price.
    ///
    /// A hit wins immediately. Otherwise: if at least one source answered
    /// cleanly (nothing listed, or unparseable text) the lookup is a miss;
    /// a failure is reported only when every source errored or timed out.
    async fn lookup(
        &self,
        name: &str,
        unit: &str,
    ) -> Result<Option<NormalizedPrice>, PricingError> {
        let mut first_failure: Option<PricingError> = None;
        let mut clean_miss = false;

        for source in &self.sources {
            match timeout(self.settings.lookup_timeout, source.fetch_raw(name, unit)).await {
                Err(_) => {
                    tracing::warn!(source = source.name(), ingredient = name, "lookup timed out");
                    first_failure.get_or_insert(PricingError::Timeout(name.to_string()));
                }
                Ok(Err(cause)) => {
                    tracing::warn!(
                        source = source.name(),
                        ingredient = name,
                        err = %cause,
                        "source failed"
                    );
                    first_failure.get_or_insert(PricingError::Source {
                        name: source.name().to_string(),
                        cause,
                    });
                }
                Ok(Ok(None)) => {
                    clean_miss = true;
                }
                Ok(Ok(Some(raw))) => {
                    let declared = raw.unit.as_deref().unwrap_or(unit);
                    if let Some(price) = normalize(&raw.text, declared) {
                        return Ok(Some(price));
                    }
                    clean_miss = true;
                }
            }
        }

        if clean_miss {
            Ok(None)
        } else if let Some(failure) = first_failure {
            Err(failure)
        } else {
            Ok(None)
        }
    }
}

/// Ingredients whose freshness stamp predates `day_start` (or was never
/// set). Keyed on `last_checked_at`: a same-day miss is already "checked
/// today" and is not retried.
fn pending_ingredients(ingredients: &[Ingredient], day_start: DateTime<Utc>) -> Vec<Ingredient> {
    ingredients
        .iter()
        .filter(|i| i.last_checked_at.map(|at| at < day_start).unwrap_or(true))
        .cloned()
        .collect()
}

/// Midnight of the current local calendar day, in UTC.
fn start_of_local_day() -> DateTime<Utc> {
    let midnight = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // midnight erased by a DST gap; nothing is older than "now"
        LocalResult::None => Utc::now(),
    }
}
