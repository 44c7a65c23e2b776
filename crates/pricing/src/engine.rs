use rust_decimal::Decimal;

use mercora_accounts::Account;
use mercora_core::Money;
use mercora_products::Product;

use crate::PricingConfig;

/// Decides what a buyer pays.
///
/// Pure and infallible: quantities are taken as given (MOQ checks belong to
/// the caller) and every returned amount is unrounded.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Per-unit price of a product for an account (`None` = anonymous).
    ///
    /// Wholesale-eligible accounts get the wholesale tier, everyone else the
    /// retail tier. An eligible account whose lifetime unit counter has
    /// passed the threshold also gets the volume discount.
    pub fn unit_price(&self, product: &Product, account: Option<&Account>) -> Money {
        let Some(account) = account.filter(|a| a.wholesale_eligible()) else {
            return product.retail_price();
        };

        let price = product.wholesale_price();
        if account.total_units_ordered() > self.config.volume_discount_threshold {
            price * (Decimal::ONE - self.config.volume_discount_rate)
        } else {
            price
        }
    }

    pub fn line_total(&self, product: &Product, quantity: i64, account: Option<&Account>) -> Money {
        self.unit_price(product, account).times(quantity)
    }

    /// Total of a cart: the sum of unrounded line totals. Rounding a line
    /// before summing would drift the total, so none happens here.
    pub fn cart_total<'a, I>(&self, lines: I, account: Option<&Account>) -> Money
    where
        I: IntoIterator<Item = (&'a Product, i64)>,
    {
        lines
            .into_iter()
            .map(|(product, quantity)| self.line_total(product, quantity, account))
            .sum()
    }
}
