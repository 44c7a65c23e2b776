use rust_decimal::Decimal;

use mercora_core::{DomainError, DomainResult, Money};

/// Commercial knobs of the pricing engine.
///
/// The engine reads every rate, threshold and cost from here; the algorithm
/// itself carries no literals. Defaults are the production values,
/// overridable through the API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Lifetime units a wholesale account must *exceed* to unlock the
    /// volume discount. Strictly greater than: hitting the threshold
    /// exactly earns nothing.
    pub volume_discount_threshold: i64,

    /// Fractional discount applied on top of the wholesale price.
    pub volume_discount_rate: Decimal,

    /// Flat tax rate applied to the unrounded subtotal.
    pub tax_rate: Decimal,

    pub standard_shipping: Money,
    pub express_shipping: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            volume_discount_threshold: 10_000,
            volume_discount_rate: Decimal::new(10, 2),
            tax_rate: Decimal::new(8, 2),
            standard_shipping: Money::new(Decimal::new(700, 2)),
            express_shipping: Money::new(Decimal::new(1_000, 2)),
        }
    }
}

impl PricingConfig {
    /// Check the knobs for sane ranges before the engine is built.
    pub fn validated(self) -> DomainResult<Self> {
        if self.volume_discount_threshold < 0 {
            return Err(DomainError::validation(
                "volume discount threshold cannot be negative",
            ));
        }
        if !(Decimal::ZERO..=Decimal::ONE).contains(&self.volume_discount_rate) {
            return Err(DomainError::validation(
                "volume discount rate must be between 0 and 1",
            ));
        }
        if !(Decimal::ZERO..=Decimal::ONE).contains(&self.tax_rate) {
            return Err(DomainError::validation("tax rate must be between 0 and 1"));
        }
        if self.standard_shipping.is_negative() || self.express_shipping.is_negative() {
            return Err(DomainError::validation("shipping cost cannot be negative"));
        }
        Ok(self)
    }
}
