//! Domain notifications.
//!
//! Business operations that outside parties care about (an order was placed, a
//! wholesale application was decided) emit a [`Notification`] after the state
//! change has been committed. Delivery is fire-and-forget: a failed delivery
//! never rolls back or fails the operation that produced it.

pub mod event;
pub mod notification;
pub mod notifier;

pub use event::Event;
pub use notification::Notification;
pub use notifier::{InMemoryNotifier, Notifier, TracingNotifier};
