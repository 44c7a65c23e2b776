//! Tiered pricing.
//!
//! One place decides what a buyer pays: the [`PricingEngine`]. Products carry
//! both price tiers, accounts carry eligibility and the lifetime unit
//! counter, and the engine combines them with [`PricingConfig`]. All
//! intermediate arithmetic is unrounded; rounding happens once, when a quote
//! is assembled or an amount is displayed.

pub mod config;
pub mod engine;
pub mod quote;

pub use config::PricingConfig;
pub use engine::PricingEngine;
pub use quote::{OrderQuote, QuotedLine, ShippingMethod};
