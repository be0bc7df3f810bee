use tokio::sync::broadcast;

use crate::domain::events::CartEvent;
use crate::domain::ports::Notifier;

/// Fans cart events out to every subscribed client stream. Slow subscribers lag and lose
/// events; publishing never blocks the caller.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<CartEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: CartEvent) {
        if let Err(e) = self.tx.send(event) {
            log::debug!("No subscribers for {:?}", e.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::new(4);
        notifier.publish(CartEvent::CartUpdated {
            user_id: Uuid::new_v4(),
        });
    }

    #[test]
    fn subscribers_receive_published_events() {
        let notifier = BroadcastNotifier::new(4);
        let mut rx = notifier.subscribe();
        let party_id = Uuid::new_v4();

        notifier.publish(CartEvent::PartyCartUpdated { party_id });

        assert_eq!(
            rx.try_recv().unwrap(),
            CartEvent::PartyCartUpdated { party_id }
        );
    }
}
