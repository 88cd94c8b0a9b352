//! Broadcast channel shared by the services.
//!
//! Every subscriber gets its own copy of each event. A subscriber that falls
//! more than `capacity` events behind loses the oldest ones.

use ledger_types::LedgerEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: LedgerEvent,
	) -> Result<(), broadcast::error::SendError<LedgerEvent>> {
		self.sender.send(event).map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ledger_types::{ActionKind, OperationEvent};

	#[tokio::test]
	async fn test_every_subscriber_receives_events() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.subscribe();

		bus.publish(LedgerEvent::Operation(OperationEvent::Refused {
			action: ActionKind::Mint,
		}))
		.unwrap();

		for rx in [&mut first, &mut second] {
			assert!(matches!(
				rx.recv().await.unwrap(),
				LedgerEvent::Operation(OperationEvent::Refused {
					action: ActionKind::Mint
				})
			));
		}
	}

	#[test]
	fn test_publish_without_subscribers_fails() {
		let bus = EventBus::new(8);
		let result = bus.publish(LedgerEvent::Operation(OperationEvent::Submitting {
			action: ActionKind::Transfer,
		}));
		assert!(result.is_err());
	}
}
