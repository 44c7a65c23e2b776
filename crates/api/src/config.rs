use anyhow::{Context, Result};
use rust_decimal::Decimal;

use mercora_core::Money;
use mercora_pricing::PricingConfig;

/// Process configuration, read once at startup.
///
/// Every pricing knob is overridable from the environment but validated
/// before the server starts; a malformed override aborts startup instead of
/// silently falling back to a default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// When absent the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub pricing: PricingConfig,
}

const DEV_SECRET: &str = "dev-secret";

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using insecure development secret");
                DEV_SECRET.to_string()
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let mut pricing = PricingConfig::default();
        if let Some(threshold) = parse_env::<i64>("VOLUME_DISCOUNT_THRESHOLD")? {
            pricing.volume_discount_threshold = threshold;
        }
        if let Some(rate) = parse_env::<Decimal>("VOLUME_DISCOUNT_RATE")? {
            pricing.volume_discount_rate = rate;
        }
        if let Some(rate) = parse_env::<Decimal>("TAX_RATE")? {
            pricing.tax_rate = rate;
        }
        if let Some(cost) = parse_env::<Money>("STANDARD_SHIPPING")? {
            pricing.standard_shipping = cost;
        }
        if let Some(cost) = parse_env::<Money>("EXPRESS_SHIPPING")? {
            pricing.express_shipping = cost;
        }
        let pricing = pricing
            .validated()
            .context("invalid pricing configuration")?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url,
            pricing,
        })
    }
}

fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{name} is not valid: '{raw}'"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
