use std::sync::{Arc, Mutex};

use crate::{Event, Notification};

/// Delivers notifications after a state change has been committed.
///
/// `notify` is infallible by contract: implementations absorb their own
/// transport failures (log and drop) so a broken outbound channel can never
/// fail or roll back the business operation that emitted the notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Notifier that writes notifications to the log.
///
/// Stands in for real outbound channels (email, webhooks) in development and
/// keeps the call sites honest about the fire-and-forget contract.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match serde_json::to_string(&notification) {
            Ok(payload) => {
                tracing::info!(event_type = notification.event_type(), %payload, "notification");
            }
            Err(error) => {
                tracing::warn!(
                    event_type = notification.event_type(),
                    %error,
                    "notification could not be serialized"
                );
            }
        }
    }
}

/// Notifier that records deliveries in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut guard) = self.delivered.lock() {
            guard.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use mercora_core::{AccountId, AggregateId, Money};

    use super::*;

    fn sample() -> Notification {
        Notification::OrderPlaced {
            order_id: AggregateId::new(),
            account_id: AccountId::new(),
            total_amount: Money::ZERO,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn in_memory_notifier_records_deliveries() {
        let notifier = InMemoryNotifier::new();
        assert!(notifier.delivered().is_empty());

        notifier.notify(sample());
        notifier.notify(sample());

        assert_eq!(notifier.delivered().len(), 2);
    }

    #[test]
    fn notifier_works_through_arc() {
        let notifier = Arc::new(InMemoryNotifier::new());
        let as_trait: Arc<dyn Notifier> = notifier.clone();

        as_trait.notify(sample());

        assert_eq!(notifier.delivered().len(), 1);
    }
}
