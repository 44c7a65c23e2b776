use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{AccountId, AggregateId, DomainError, DomainResult, Money};
use mercora_pricing::{OrderQuote, QuotedLine, ShippingMethod};
use mercora_products::ProductId;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Fulfilment status of an order.
///
/// `Pending`, `Processing`, `Shipped` and `Delivered` form a one-way
/// pipeline; `Cancelled` is a side exit open only before shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position in the fulfilment pipeline. `Cancelled` sits outside it and
    /// is never compared by rank.
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Cancelled => 4,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Denormalized purchase snapshot. The unit price is whatever the pricing
/// engine produced at checkout and is never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<QuotedLine> for OrderLine {
    fn from(line: QuotedLine) -> Self {
        Self {
            product_id: line.product_id,
            sku: line.sku,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// A successful status transition, reported for notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    account_id: AccountId,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    subtotal: Money,
    shipping_cost: Money,
    tax_amount: Money,
    total_amount: Money,
    shipping_method: ShippingMethod,
    shipping_address: ShippingAddress,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Command: CreateOrder. Wraps the priced quote the checkout produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrder {
    pub account_id: AccountId,
    pub quote: OrderQuote,
    pub shipping_method: ShippingMethod,
    pub shipping_address: ShippingAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Persisted shape of an order, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
    pub id: OrderId,
    pub account_id: AccountId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub shipping_method: ShippingMethod,
    pub shipping_address: ShippingAddress,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order from a priced quote.
    ///
    /// The lines and amounts are validated for shape, and the quoted
    /// subtotal is recomputed from the lines: a mismatch means the caller
    /// assembled the quote by hand and gets a `Consistency` error. Tax and
    /// shipping are config-dependent and are taken as quoted.
    pub fn create(cmd: CreateOrder) -> DomainResult<Self> {
        let quote = cmd.quote;
        if quote.lines.is_empty() {
            return Err(DomainError::validation("an order requires at least one line"));
        }
        for line in &quote.lines {
            if line.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "line quantity for '{}' must be at least 1",
                    line.sku
                )));
            }
            if line.unit_price.is_negative() {
                return Err(DomainError::validation(format!(
                    "unit price for '{}' cannot be negative",
                    line.sku
                )));
            }
        }
        if quote.shipping_cost.is_negative()
            || quote.tax_amount.is_negative()
            || quote.total_amount.is_negative()
        {
            return Err(DomainError::validation("order amounts cannot be negative"));
        }

        let recomputed: Money = quote
            .lines
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum();
        if recomputed.rounded() != quote.subtotal {
            return Err(DomainError::consistency(
                "order subtotal does not match its lines",
            ));
        }

        Ok(Self {
            id: OrderId::new(AggregateId::new()),
            account_id: cmd.account_id,
            status: OrderStatus::Pending,
            lines: quote.lines.into_iter().map(OrderLine::from).collect(),
            subtotal: quote.subtotal,
            shipping_cost: quote.shipping_cost,
            tax_amount: quote.tax_amount,
            total_amount: quote.total_amount,
            shipping_method: cmd.shipping_method,
            shipping_address: cmd.shipping_address,
            placed_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    /// Drive the status machine.
    ///
    /// Re-applying the current status is an idempotent no-op (`Ok(None)`).
    /// Forward moves along the pipeline succeed, including skips;
    /// `Cancelled` is reachable from `Pending`/`Processing` only. Anything
    /// else (backwards, or out of a terminal state) is an invariant
    /// violation. Only `status` and `updated_at` ever change.
    pub fn set_status(
        &mut self,
        new_status: OrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<StatusChange>> {
        use OrderStatus::*;

        if new_status == self.status {
            return Ok(None);
        }

        let allowed = match (self.status, new_status) {
            (Delivered | Cancelled, _) => false,
            (from, Cancelled) => matches!(from, Pending | Processing),
            (from, to) => from.rank() < to.rank(),
        };
        if !allowed {
            return Err(DomainError::invariant(format!(
                "order cannot move from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            )));
        }

        let change = StatusChange {
            from: self.status,
            to: new_status,
        };
        self.status = new_status;
        self.updated_at = now;
        Ok(Some(change))
    }

    /// Rehydrate from persisted state.
    pub fn from_state(state: OrderState) -> Self {
        Self {
            id: state.id,
            account_id: state.account_id,
            status: state.status,
            lines: state.lines,
            subtotal: state.subtotal,
            shipping_cost: state.shipping_cost,
            tax_amount: state.tax_amount,
            total_amount: state.total_amount,
            shipping_method: state.shipping_method,
            shipping_address: state.shipping_address,
            placed_at: state.placed_at,
            updated_at: state.updated_at,
        }
    }

    pub fn state(&self) -> OrderState {
        OrderState {
            id: self.id,
            account_id: self.account_id,
            status: self.status,
            lines: self.lines.clone(),
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            shipping_method: self.shipping_method,
            shipping_address: self.shipping_address.clone(),
            placed_at: self.placed_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_units(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn tax_amount(&self) -> Money {
        self.tax_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_method(&self) -> ShippingMethod {
        self.shipping_method
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn quoted_line(sku: &str, quantity: i64, unit_price: Money) -> QuotedLine {
        QuotedLine {
            product_id: ProductId::new(AggregateId::new()),
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            quantity,
            unit_price,
        }
    }

    fn quote() -> OrderQuote {
        // 18.99 * 0.90 = 17.091; totals as the pricing engine rounds them.
        OrderQuote {
            lines: vec![quoted_line(
                "WID-0001",
                1,
                Money::new(Decimal::new(17_091, 3)),
            )],
            subtotal: money("17.09"),
            shipping_cost: money("7.00"),
            tax_amount: money("1.37"),
            total_amount: money("25.46"),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Depot Way".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
        }
    }

    fn create_cmd() -> CreateOrder {
        CreateOrder {
            account_id: AccountId::new(),
            quote: quote(),
            shipping_method: ShippingMethod::Standard,
            shipping_address: address(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn create_captures_the_quote_as_a_snapshot() {
        let cmd = create_cmd();
        let order = Order::create(cmd.clone()).unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.account_id(), cmd.account_id);
        assert_eq!(order.lines().len(), 1);
        assert_eq!(
            order.lines()[0].unit_price.amount(),
            Decimal::new(17_091, 3)
        );
        assert_eq!(order.subtotal(), money("17.09"));
        assert_eq!(order.shipping_cost(), money("7.00"));
        assert_eq!(order.tax_amount(), money("1.37"));
        assert_eq!(order.total_amount(), money("25.46"));
        assert_eq!(order.total_units(), 1);
        assert_eq!(order.placed_at(), cmd.occurred_at);
        assert_eq!(order.updated_at(), cmd.occurred_at);
    }

    #[test]
    fn create_rejects_an_empty_line_set() {
        let mut cmd = create_cmd();
        cmd.quote.lines.clear();
        cmd.quote.subtotal = Money::ZERO;

        let err = Order::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_non_positive_quantities() {
        let mut cmd = create_cmd();
        cmd.quote.lines[0].quantity = 0;

        let err = Order::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_negative_prices() {
        let mut cmd = create_cmd();
        cmd.quote.lines[0].unit_price = money("-1.00");

        let err = Order::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_a_subtotal_that_disagrees_with_the_lines() {
        let mut cmd = create_cmd();
        cmd.quote.subtotal = money("99.99");

        let err = Order::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Consistency(_)));
    }

    #[test]
    fn forward_transitions_walk_the_pipeline() {
        let mut order = Order::create(create_cmd()).unwrap();

        let change = order
            .set_status(OrderStatus::Processing, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(change.to, OrderStatus::Processing);

        order.set_status(OrderStatus::Shipped, Utc::now()).unwrap();
        order
            .set_status(OrderStatus::Delivered, Utc::now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn skipping_forward_is_allowed() {
        let mut order = Order::create(create_cmd()).unwrap();

        let change = order
            .set_status(OrderStatus::Shipped, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(change.to, OrderStatus::Shipped);
    }

    #[test]
    fn reapplying_the_current_status_is_a_noop() {
        let mut order = Order::create(create_cmd()).unwrap();
        let before = order.updated_at();

        let change = order.set_status(OrderStatus::Pending, Utc::now()).unwrap();

        assert!(change.is_none());
        assert_eq!(order.updated_at(), before);
    }

    #[test]
    fn backward_moves_violate_the_pipeline() {
        let mut order = Order::create(create_cmd()).unwrap();
        order.set_status(OrderStatus::Shipped, Utc::now()).unwrap();

        let err = order
            .set_status(OrderStatus::Processing, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn cancellation_is_only_open_before_shipment() {
        let mut order = Order::create(create_cmd()).unwrap();
        order
            .set_status(OrderStatus::Cancelled, Utc::now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let mut order = Order::create(create_cmd()).unwrap();
        order
            .set_status(OrderStatus::Processing, Utc::now())
            .unwrap();
        order
            .set_status(OrderStatus::Cancelled, Utc::now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let mut order = Order::create(create_cmd()).unwrap();
        order.set_status(OrderStatus::Shipped, Utc::now()).unwrap();
        let err = order
            .set_status(OrderStatus::Cancelled, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn terminal_states_accept_nothing_but_themselves() {
        let mut delivered = Order::create(create_cmd()).unwrap();
        delivered
            .set_status(OrderStatus::Delivered, Utc::now())
            .unwrap();

        assert!(delivered.set_status(OrderStatus::Delivered, Utc::now()).unwrap().is_none());
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
        ] {
            let err = delivered.set_status(next, Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::InvariantViolation(_)));
        }

        let mut cancelled = Order::create(create_cmd()).unwrap();
        cancelled
            .set_status(OrderStatus::Cancelled, Utc::now())
            .unwrap();
        assert!(cancelled.set_status(OrderStatus::Cancelled, Utc::now()).unwrap().is_none());
        let err = cancelled
            .set_status(OrderStatus::Processing, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn status_changes_leave_the_snapshot_alone() {
        let mut order = Order::create(create_cmd()).unwrap();
        let lines_before = order.lines().to_vec();
        let total_before = order.total_amount();

        order
            .set_status(OrderStatus::Delivered, Utc::now())
            .unwrap();

        assert_eq!(order.lines(), lines_before.as_slice());
        assert_eq!(order.total_amount(), total_before);
        assert_eq!(order.subtotal(), money("17.09"));
    }

    #[test]
    fn status_parses_wire_strings_and_rejects_unknown_ones() {
        assert_eq!(
            "processing".parse::<OrderStatus>().unwrap(),
            OrderStatus::Processing
        );
        assert_eq!(OrderStatus::Shipped.as_str(), "shipped");

        let err = "refunded".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn state_round_trips() {
        let mut order = Order::create(create_cmd()).unwrap();
        order
            .set_status(OrderStatus::Processing, Utc::now())
            .unwrap();

        let rehydrated = Order::from_state(order.state());
        assert_eq!(rehydrated, order);
    }

    #[cfg(test)]
    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn any_status() -> impl Strategy<Value = OrderStatus> {
            prop_oneof![
                Just(OrderStatus::Pending),
                Just(OrderStatus::Processing),
                Just(OrderStatus::Shipped),
                Just(OrderStatus::Delivered),
                Just(OrderStatus::Cancelled),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: whatever transition requests arrive, the pipeline
            /// never runs backwards and terminal states never change.
            #[test]
            fn lifecycle_never_regresses(
                requests in proptest::collection::vec(any_status(), 0..12)
            ) {
                let mut order = Order::create(super::create_cmd()).unwrap();

                for requested in requests {
                    let before = order.status();
                    let outcome = order.set_status(requested, Utc::now());
                    let after = order.status();

                    match outcome {
                        Ok(Some(change)) => {
                            prop_assert_eq!(change.from, before);
                            prop_assert_eq!(change.to, after);
                            prop_assert!(!before.is_terminal());
                            if after != OrderStatus::Cancelled {
                                prop_assert!(matches!(
                                    before,
                                    OrderStatus::Pending
                                        | OrderStatus::Processing
                                        | OrderStatus::Shipped
                                ));
                            }
                        }
                        Ok(None) => prop_assert_eq!(before, after),
                        Err(_) => prop_assert_eq!(before, after),
                    }
                }
            }

            /// Property: the monetary snapshot is identical before and after
            /// any sequence of transition attempts.
            #[test]
            fn totals_survive_every_transition(
                requests in proptest::collection::vec(any_status(), 0..12)
            ) {
                let mut order = Order::create(super::create_cmd()).unwrap();
                let snapshot = (
                    order.lines().to_vec(),
                    order.subtotal(),
                    order.shipping_cost(),
                    order.tax_amount(),
                    order.total_amount(),
                );

                for requested in requests {
                    let _ = order.set_status(requested, Utc::now());
                }

                prop_assert_eq!(order.lines(), snapshot.0.as_slice());
                prop_assert_eq!(order.subtotal(), snapshot.1);
                prop_assert_eq!(order.shipping_cost(), snapshot.2);
                prop_assert_eq!(order.tax_amount(), snapshot.3);
                prop_assert_eq!(order.total_amount(), snapshot.4);
            }
        }
    }
}
