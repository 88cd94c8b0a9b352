//! Watched reads.
//!
//! A watch re-issues one query on a fixed cadence and publishes each result
//! through a `tokio::sync::watch` channel, so subscribers always see exactly
//! one current `ReadResult`. Fetches run strictly one after another: at most
//! one is in flight, results arrive in fetch-start order, and ticks that fire
//! while a fetch is running are skipped.
//!
//! Cancellation takes the sender out of a shared slot under a lock before the
//! task is aborted. The task publishes under the same lock, so once `cancel`
//! returns no result can reach subscribers.

use crate::NodeReadClient;
use ledger_types::{ReadQuery, ReadResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;

type SenderSlot = Arc<Mutex<Option<watch::Sender<ReadResult>>>>;

fn lock(slot: &SenderSlot) -> MutexGuard<'_, Option<watch::Sender<ReadResult>>> {
	slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Requests an out-of-cadence fetch for a watch.
///
/// Cheap to clone; firing on a cancelled watch is a no-op.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
	query_key: String,
	tx: mpsc::Sender<()>,
}

impl RefreshTrigger {
	pub fn query_key(&self) -> &str {
		&self.query_key
	}

	/// Asks for a refetch. Requests coalesce while one is already queued.
	pub fn fire(&self) {
		// Full means a refresh is already queued; Closed means the watch ended.
		let _ = self.tx.try_send(());
	}

	/// Whether the watch behind this trigger has ended.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Owner of a running watch.
pub struct WatchHandle {
	query: ReadQuery,
	receiver: watch::Receiver<ReadResult>,
	slot: SenderSlot,
	refresh: RefreshTrigger,
	task: JoinHandle<()>,
}

impl WatchHandle {
	pub(crate) fn spawn(client: NodeReadClient, query: ReadQuery, interval: Duration) -> Self {
		let query = query.watched(interval);
		let (tx, receiver) = watch::channel(ReadResult::loading());
		let slot: SenderSlot = Arc::new(Mutex::new(Some(tx)));
		let (refresh_tx, refresh_rx) = mpsc::channel(1);

		let task = tokio::spawn(run_watch(
			client,
			query.clone(),
			interval,
			slot.clone(),
			refresh_rx,
		));

		Self {
			refresh: RefreshTrigger {
				query_key: query.key(),
				tx: refresh_tx,
			},
			query,
			receiver,
			slot,
			task,
		}
	}

	/// The watched query, carrying the cadence it runs at.
	pub fn query(&self) -> &ReadQuery {
		&self.query
	}

	/// The current snapshot.
	pub fn current(&self) -> ReadResult {
		self.receiver.borrow().clone()
	}

	/// Waits for the next snapshot. Returns `None` once the watch is cancelled.
	pub async fn next(&mut self) -> Option<ReadResult> {
		self.receiver.changed().await.ok()?;
		Some(self.receiver.borrow_and_update().clone())
	}

	/// Another receiver of the same snapshots.
	pub fn subscribe(&self) -> watch::Receiver<ReadResult> {
		self.receiver.clone()
	}

	/// Snapshots as a stream, starting with the current one.
	pub fn stream(&self) -> WatchStream<ReadResult> {
		WatchStream::new(self.receiver.clone())
	}

	pub fn refresh_trigger(&self) -> RefreshTrigger {
		self.refresh.clone()
	}

	/// Requests an immediate refetch.
	pub fn refresh(&self) {
		self.refresh.fire();
	}

	pub fn is_cancelled(&self) -> bool {
		lock(&self.slot).is_none()
	}

	/// Stops future ticks and discards any in-flight result.
	pub fn cancel(&self) {
		if lock(&self.slot).take().is_some() {
			tracing::debug!(query = %self.query.key(), "Watch cancelled");
		}
		self.task.abort();
	}
}

impl Drop for WatchHandle {
	fn drop(&mut self) {
		self.cancel();
	}
}

async fn run_watch(
	client: NodeReadClient,
	query: ReadQuery,
	interval: Duration,
	slot: SenderSlot,
	mut refresh_rx: mpsc::Receiver<()>,
) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			_ = ticker.tick() => {}
			Some(()) = refresh_rx.recv() => {
				tracing::debug!(query = %query.key(), "Refresh requested");
			}
		}

		let started = Instant::now();
		let result = client.read(&query).await;

		{
			let guard = lock(&slot);
			match guard.as_ref() {
				Some(tx) => {
					tx.send_replace(result);
				},
				None => break,
			}
		}

		// Ticks that elapsed during a slow fetch are dropped, not replayed.
		if started.elapsed() >= interval {
			ticker.reset();
		}
	}
}
