use chrono::{DateTime, Utc};

/// A fact emitted by a business operation.
///
/// Events are immutable: they describe something that already happened and
/// carry the business time at which it happened.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "orders.order.placed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
