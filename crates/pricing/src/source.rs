use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw price material as published by an external source: free-form price
/// text plus, when the source knows it, the unit that text refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrice {
    pub text: String,
    pub unit: Option<String>,
}

/// One collaborator in the ordered price-source chain. `Ok(None)` is an
/// expected miss (nothing listed for that ingredient); `Err` is an external
/// failure and lets the caller decide whether to fall through or abort.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_raw(&self, ingredient_name: &str, unit: &str)
    -> anyhow::Result<Option<RawPrice>>;
}

/// Market scraping sidecar. A plain HTTP façade over the browser-automation
/// service that walks grocery listings; queried per ingredient name.
pub struct MarketScrapeSource {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct MarketQuote {
    price_text: Option<String>,
    unit: Option<String>,
}

impl MarketScrapeSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PriceSource for MarketScrapeSource {
    fn name(&self) -> &str {
        "market-scrape"
    }

    async fn fetch_raw(
        &self,
        ingredient_name: &str,
        unit: &str,
    ) -> anyhow::Result<Option<RawPrice>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("name", ingredient_name), ("unit", unit)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let quote: MarketQuote = response.error_for_status()?.json().await?;

        Ok(quote
            .price_text
            .filter(|text| !text.trim().is_empty())
            .map(|text| RawPrice {
                text,
                unit: quote.unit,
            }))
    }
}

/// AI estimation fallback: asks a text-generation endpoint for a typical
/// wet-market price and parses the strict-JSON answer. Used only when the
/// scrape chain ahead of it produced nothing.
pub struct AiEstimateSource {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct EstimateRequest<'a> {
    model: &'a str,
    prompt: String,
}

#[derive(Deserialize)]
struct EstimateResponse {
    output: String,
}

#[derive(Deserialize)]
struct EstimateJson {
    price_text: String,
    unit: Option<String>,
}

impl AiEstimateSource {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    fn build_prompt(ingredient_name: &str, unit: &str) -> String {
        format!(
            r#"Estimate the current typical price at a Vietnamese wet market for 1 {unit} of "{ingredient_name}".

Respond with ONLY a JSON object, no other text. Example format:
{{"price_text": "35.000đ/kg", "unit": "kg"}}

Use VND with thousands separators in price_text. If you cannot estimate a price, respond with:
{{"price_text": "", "unit": null}}"#
        )
    }

    /// Pull the JSON object out of a model response that may wrap it in
    /// prose or code fences. Empty price text means the model declined.
    fn parse_estimate(output: &str) -> Option<RawPrice> {
        let start = output.find('{')?;
        let end = output.rfind('}')?;
        let estimate: EstimateJson = serde_json::from_str(output.get(start..=end)?).ok()?;

        if estimate.price_text.trim().is_empty() {
            return None;
        }
        Some(RawPrice {
            text: estimate.price_text,
            unit: estimate.unit,
        })
    }
}

#[async_trait]
impl PriceSource for AiEstimateSource {
    fn name(&self) -> &str {
        "ai-estimate"
    }

    async fn fetch_raw(
        &self,
        ingredient_name: &str,
        unit: &str,
    ) -> anyhow::Result<Option<RawPrice>> {
        let request = EstimateRequest {
            model: &self.model,
            prompt: Self::build_prompt(ingredient_name, unit),
        };

        let response: EstimateResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Self::parse_estimate(&response.output))
    }
}
