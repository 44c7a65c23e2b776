use core::str::FromStr;

use serde::{Deserialize, Serialize};

use mercora_accounts::Account;
use mercora_core::{DomainError, Money};
use mercora_products::{Product, ProductId};

use crate::PricingEngine;

/// How an order ships. Costs live in [`crate::PricingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ShippingMethod::Standard),
            "express" => Ok(ShippingMethod::Express),
            other => Err(DomainError::validation(format!(
                "unknown shipping method '{other}'"
            ))),
        }
    }
}

/// One priced line of a quote. `unit_price` is the unrounded captured price
/// that order snapshots carry forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A fully priced order candidate.
///
/// The three totals are rounded to currency precision here, at assembly;
/// everything they were derived from stayed unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub lines: Vec<QuotedLine>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
}

impl PricingEngine {
    pub fn shipping_cost(&self, method: ShippingMethod) -> Money {
        match method {
            ShippingMethod::Standard => self.config().standard_shipping,
            ShippingMethod::Express => self.config().express_shipping,
        }
    }

    /// Price a set of items into an order quote.
    ///
    /// Tax applies to the unrounded subtotal, not the rounded one; the grand
    /// total is summed from raw parts and rounded last.
    pub fn quote<'a, I>(
        &self,
        items: I,
        account: Option<&Account>,
        method: ShippingMethod,
    ) -> OrderQuote
    where
        I: IntoIterator<Item = (&'a Product, i64)>,
    {
        let mut lines = Vec::new();
        let mut subtotal_raw = Money::ZERO;

        for (product, quantity) in items {
            let unit_price = self.unit_price(product, account);
            subtotal_raw += unit_price.times(quantity);
            lines.push(QuotedLine {
                product_id: product.id(),
                sku: product.sku().to_string(),
                name: product.name().to_string(),
                quantity,
                unit_price,
            });
        }

        let shipping_cost = self.shipping_cost(method);
        let tax_raw = subtotal_raw * self.config().tax_rate;
        let total_raw = subtotal_raw + shipping_cost + tax_raw;

        OrderQuote {
            lines,
            subtotal: subtotal_raw.rounded(),
            shipping_cost: shipping_cost.rounded(),
            tax_amount: tax_raw.rounded(),
            total_amount: total_raw.rounded(),
        }
    }
}
