use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::{ArgKey, TrackedFn};

/// One committed counter transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderChange {
	pub function: TrackedFn,
	/// Padded argument keys of the call.
	pub args: Vec<ArgKey>,
	/// Counter value after the transition.
	pub count: usize,
}

/// Handle returned by [`LoaderState::subscribe`](crate::LoaderState::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback = Arc<dyn Fn(&LoaderChange) + Send + Sync>;

/// Registered change callbacks.
#[derive(Default)]
pub(crate) struct Observers {
	next: AtomicU64,
	callbacks: Mutex<Vec<(Subscription, Callback)>>,
}

impl Observers {
	pub(crate) fn add(&self, callback: Callback) -> Subscription {
		let id = Subscription(self.next.fetch_add(1, Ordering::Relaxed));
		self.callbacks.lock().push((id, callback));
		id
	}

	pub(crate) fn remove(&self, id: Subscription) -> bool {
		let mut callbacks = self.callbacks.lock();
		let before = callbacks.len();
		callbacks.retain(|(existing, _)| *existing != id);
		callbacks.len() != before
	}

	pub(crate) fn len(&self) -> usize {
		self.callbacks.lock().len()
	}

	/// Calls every callback with `change`.
	///
	/// Callbacks are cloned out first so they may subscribe, unsubscribe, or
	/// query the state without deadlocking.
	pub(crate) fn notify(&self, change: &LoaderChange) {
		let callbacks: Vec<Callback> = self.callbacks.lock().iter().map(|(_, callback)| Arc::clone(callback)).collect();
		for callback in callbacks {
			callback(change);
		}
	}
}
