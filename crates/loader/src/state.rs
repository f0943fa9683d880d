use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, Weak};

use inflight_path_store::{NodeRef, PathStore, Segment};
use parking_lot::{ReentrantMutex, RwLock};

use crate::key::PathKey;
use crate::observe::{LoaderChange, Observers, Subscription};
use crate::{ArgKey, ExcessArgs, LoaderConfig, LoaderError, QueryArg, Registrar, Result, TrackedFn};


/// Shared in-flight counters for tracked functions.
///
/// Cloning yields another handle to the same counters. Each counter lives at
/// the path `[function, arg0, arg1, ...]`, with arguments padded by
/// [`ArgKey::Unset`] to the function's declared arity.
#[derive(Clone)]
pub struct LoaderState {
	inner: Arc<Inner>,
}

struct Inner {
	config: LoaderConfig,
	store: RwLock<PathStore<PathKey, usize>>,
	observers: Observers,
}

impl Default for LoaderState {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for LoaderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoaderState")
			.field("label", &self.inner.config.label)
			.field("functions", &self.inner.store.read().len())
			.field("observers", &self.inner.observers.len())
			.finish()
	}
}

impl LoaderState {
	/// Creates an empty state with default configuration.
	pub fn new() -> Self {
		Self::with_config(LoaderConfig::default())
	}

	/// Creates an empty state with `config`.
	pub fn with_config(config: LoaderConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				store: RwLock::new(PathStore::new()),
				observers: Observers::default(),
			}),
		}
	}

	pub fn config(&self) -> &LoaderConfig {
		&self.inner.config
	}

	/// Returns `true` if no call has ever been recorded.
	pub fn is_empty(&self) -> bool {
		self.inner.store.read().is_empty()
	}

	/// Starts explicit registration of tracked members.
	pub fn registrar(&self) -> Registrar {
		Registrar::new(self.clone())
	}

	/// Records the start (`is_loading == true`) or completion of one call.
	///
	/// Returns the counter after the transition. A completion without a
	/// matching start fails with [`LoaderError::Underflow`] and leaves the
	/// counter untouched.
	pub fn set_loader(&self, function: &TrackedFn, args: &[ArgKey], is_loading: bool) -> Result<usize> {
		let args = self.pad(function, args)?;
		let path = counter_path(function, &args);

		let count = {
			let mut store = self.inner.store.write();
			let current = match store.deep_get(&path) {
				None if !crosses_terminal(&store, &path) => 0,
				Some(NodeRef::Terminal(count)) => *count,
				None | Some(NodeRef::Interior(_)) => {
					return Err(LoaderError::ShapeMismatch {
						function: function.name().to_string(),
					});
				}
			};
			let next = if is_loading {
				current + 1
			} else {
				let Some(next) = current.checked_sub(1) else {
					tracing::error!(state = %self.inner.config.label, function = %function, args = ?args, "loader.underflow");
					return Err(LoaderError::Underflow {
						function: function.name().to_string(),
						args,
					});
				};
				next
			};
			store.deep_set(&path, next)?;
			next
		};

		tracing::trace!(state = %self.inner.config.label, function = %function, count, loading = is_loading, "loader.set");
		self.inner.observers.notify(&LoaderChange {
			function: function.clone(),
			args,
			count,
		});
		Ok(count)
	}

	/// Returns `true` if any matching call is in flight.
	///
	/// - `None` aggregates over every call of `function`.
	/// - Exact arguments read the single padded counter.
	/// - [`QueryArg::Wildcard`] positions aggregate over every stored argument
	///   at that position.
	pub fn get_loader(&self, function: &TrackedFn, args: Option<&[QueryArg]>) -> Result<bool> {
		Ok(self.running(function, args)? > 0)
	}

	/// Sum of the counters matched by a [`get_loader`](Self::get_loader) query.
	pub fn running(&self, function: &TrackedFn, args: Option<&[QueryArg]>) -> Result<usize> {
		let root = PathKey::Function(function.identity().clone());

		let Some(args) = args else {
			let store = self.inner.store.read();
			let node = store.deep_get(std::slice::from_ref(&root));
			return Ok(PathStore::deep_get_all_terminals(node).into_iter().sum());
		};

		let take = self.accepted_len(function, args.len())?;
		let args = &args[..take];
		let padding = function.arity() - take;

		if args.iter().any(|arg| matches!(arg, QueryArg::Wildcard)) {
			let pattern: Vec<Segment<PathKey>> = std::iter::once(Segment::Key(root))
				.chain(args.iter().map(|arg| match arg {
					QueryArg::Exact(key) => Segment::Key(PathKey::Arg(key.clone())),
					QueryArg::Wildcard => Segment::Any,
				}))
				.chain(std::iter::repeat_n(Segment::Key(PathKey::Arg(ArgKey::Unset)), padding))
				.collect();
			let store = self.inner.store.read();
			return Ok(store.deep_get_with_wildcard(&pattern).into_iter().sum());
		}

		let exact: Vec<ArgKey> = args
			.iter()
			.filter_map(|arg| match arg {
				QueryArg::Exact(key) => Some(key.clone()),
				QueryArg::Wildcard => None,
			})
			.collect();
		self.count(function, &exact)
	}

	/// Current counter for exactly these (padded) arguments.
	pub fn count(&self, function: &TrackedFn, args: &[ArgKey]) -> Result<usize> {
		let args = self.pad(function, args)?;
		let path = counter_path(function, &args);
		let store = self.inner.store.read();
		Ok(store.deep_get(&path).and_then(NodeRef::terminal).copied().unwrap_or(0))
	}

	/// Registers `callback` for every committed transition.
	///
	/// Callbacks run after the counter is written and the lock released.
	pub fn subscribe<C>(&self, callback: C) -> Subscription
	where
		C: Fn(&LoaderChange) + Send + Sync + 'static,
	{
		self.inner.observers.add(Arc::new(callback))
	}

	/// Removes a subscription. Returns `false` if it was already gone.
	pub fn unsubscribe(&self, subscription: Subscription) -> bool {
		self.inner.observers.remove(subscription)
	}

	/// Runs `callback` with the current result of a query, then again each
	/// time that result flips.
	///
	/// Transitions that leave the result unchanged, such as calls with other
	/// arguments, do not fire the callback.
	pub fn react<C>(&self, function: &TrackedFn, args: Option<Vec<QueryArg>>, callback: C) -> Result<Subscription>
	where
		C: Fn(bool) + Send + Sync + 'static,
	{
		let initial = self.get_loader(function, args.as_deref())?;
		callback(initial);

		// Held across read, compare and callback so concurrent notifications
		// are applied one at a time against fresh state. Reentrant so a
		// callback may itself start or finish calls.
		let last = ReentrantMutex::new(Cell::new(initial));
		let weak: Weak<Inner> = Arc::downgrade(&self.inner);
		let function = function.clone();
		Ok(self.subscribe(move |change| {
			if change.function.identity() != function.identity() {
				return;
			}
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let state = LoaderState { inner };
			let last = last.lock();
			let Ok(loading) = state.get_loader(&function, args.as_deref()) else {
				return;
			};
			if last.replace(loading) != loading {
				callback(loading);
			}
		}))
	}

	/// Number of leading arguments kept under the excess argument policy.
	fn accepted_len(&self, function: &TrackedFn, given: usize) -> Result<usize> {
		if given <= function.arity() {
			return Ok(given);
		}
		match self.inner.config.excess_args {
			ExcessArgs::Truncate => Ok(function.arity()),
			ExcessArgs::Reject => Err(LoaderError::ArityExceeded {
				function: function.name().to_string(),
				arity: function.arity(),
				given,
			}),
		}
	}

	/// Right-pads `args` with [`ArgKey::Unset`] to the declared arity.
	fn pad(&self, function: &TrackedFn, args: &[ArgKey]) -> Result<Vec<ArgKey>> {
		let take = self.accepted_len(function, args.len())?;
		let mut padded = Vec::with_capacity(function.arity());
		padded.extend_from_slice(&args[..take]);
		padded.resize(function.arity(), ArgKey::Unset);
		Ok(padded)
	}
}

fn counter_path(function: &TrackedFn, args: &[ArgKey]) -> Vec<PathKey> {
	std::iter::once(PathKey::Function(function.identity().clone()))
		.chain(args.iter().cloned().map(PathKey::Arg))
		.collect()
}

/// Returns `true` if a strict prefix of `path` already ends in a counter.
fn crosses_terminal(store: &PathStore<PathKey, usize>, path: &[PathKey]) -> bool {
	(1..path.len()).any(|depth| matches!(store.deep_get(&path[..depth]), Some(NodeRef::Terminal(_))))
}
