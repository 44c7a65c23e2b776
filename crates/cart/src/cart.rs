use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{AccountId, AggregateId, DomainError, DomainResult};
use mercora_products::ProductId;

/// Cart line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineId(pub AggregateId);

impl CartLineId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CartLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One product in a cart. Quantity only; the catalog prices it at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

/// Aggregate root: one buyer's cart.
///
/// A product appears in at most one line; adding it again merges into the
/// existing line. MOQ is deliberately not checked here (the services guard
/// it on add, update and checkout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    account_id: AccountId,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            lines: Vec::new(),
        }
    }

    /// Rehydrate from persisted lines.
    pub fn from_lines(account_id: AccountId, lines: Vec<CartLine>) -> Self {
        Self { account_id, lines }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_units(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Add a product to the cart, merging into the existing line when the
    /// product is already present.
    pub fn add_line(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<CartLineId> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity += quantity;
            return Ok(line.id);
        }

        let id = CartLineId::new(AggregateId::new());
        self.lines.push(CartLine {
            id,
            account_id: self.account_id,
            product_id,
            quantity,
            added_at: now,
        });
        Ok(id)
    }

    /// Set a line's quantity. Anything at or below zero removes the line.
    pub fn update_quantity(&mut self, line_id: CartLineId, quantity: i64) -> DomainResult<()> {
        let position = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or_else(DomainError::not_found)?;

        if quantity <= 0 {
            self.lines.remove(position);
        } else {
            self.lines[position].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: CartLineId) -> DomainResult<()> {
        let position = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or_else(DomainError::not_found)?;
        self.lines.remove(position);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
