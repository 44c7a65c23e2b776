use chrono::{DateTime, Utc};
use serde::Serialize;

use mercora_core::{AccountId, AggregateId, Money};

use crate::Event;

/// Outbound notification payloads.
///
/// Statuses are carried as their wire strings so this crate stays independent
/// of the domain crates that define them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    OrderPlaced {
        order_id: AggregateId,
        account_id: AccountId,
        total_amount: Money,
        occurred_at: DateTime<Utc>,
    },
    OrderStatusChanged {
        order_id: AggregateId,
        account_id: AccountId,
        from: String,
        to: String,
        occurred_at: DateTime<Utc>,
    },
    ApplicationApproved {
        application_id: AggregateId,
        account_id: AccountId,
        occurred_at: DateTime<Utc>,
    },
    ApplicationRejected {
        application_id: AggregateId,
        account_id: AccountId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for Notification {
    fn event_type(&self) -> &'static str {
        match self {
            Notification::OrderPlaced { .. } => "orders.order.placed",
            Notification::OrderStatusChanged { .. } => "orders.order.status_changed",
            Notification::ApplicationApproved { .. } => "wholesale.application.approved",
            Notification::ApplicationRejected { .. } => "wholesale.application.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Notification::OrderPlaced { occurred_at, .. }
            | Notification::OrderStatusChanged { occurred_at, .. }
            | Notification::ApplicationApproved { occurred_at, .. }
            | Notification::ApplicationRejected { occurred_at, .. } => *occurred_at,
        }
    }
}
