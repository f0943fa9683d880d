use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;

use crate::{ArgKey, ArgTuple, LoaderState, QueryArg, Result, TrackedFn};

#[cfg(test)]
mod tests;

/// Synchronous result of a wrapped function.
///
/// Returning `Immediate` tells the wrapper there is nothing in flight; the
/// value is handed back untouched and no counter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Immediate<T>(pub T);

/// Result of a wrapped function, deciding whether the call is tracked.
///
/// Futures are tracked until they resolve; [`Immediate`] values never are.
pub trait Invocation {
	/// What the wrapped call returns.
	type Output;

	/// Converts the raw result, starting a tracked call if `start` is given
	/// and the result is deferred.
	fn into_output(self, start: Option<Start<'_>>) -> Self::Output;
}

impl<F: Future> Invocation for F {
	type Output = Tracked<F>;

	fn into_output(self, start: Option<Start<'_>>) -> Tracked<F> {
		Tracked {
			inner: self,
			ticket: start.and_then(Start::begin),
		}
	}
}

impl<T> Invocation for Immediate<T> {
	type Output = T;

	fn into_output(self, _start: Option<Start<'_>>) -> T {
		self.0
	}
}

/// Pending start of one tracked call.
pub struct Start<'a> {
	state: &'a LoaderState,
	function: &'a TrackedFn,
	args: Vec<ArgKey>,
}

impl Start<'_> {
	/// Increments the counter, returning the ticket that will decrement it.
	fn begin(self) -> Option<Ticket> {
		match self.state.set_loader(self.function, &self.args, true) {
			Ok(count) => {
				tracing::trace!(state = %self.state.config().label, function = %self.function, count, "loader.wrap");
				Some(Ticket {
					state: self.state.clone(),
					function: self.function.clone(),
					args: self.args,
					settled: false,
				})
			}
			Err(error) => {
				tracing::error!(state = %self.state.config().label, function = %self.function, %error, "loader.start_failed");
				None
			}
		}
	}
}

/// Obligation to record the completion of one started call.
struct Ticket {
	state: LoaderState,
	function: TrackedFn,
	args: Vec<ArgKey>,
	settled: bool,
}

impl Ticket {
	fn settle(&mut self) -> Result<usize> {
		self.settled = true;
		self.state.set_loader(&self.function, &self.args, false)
	}
}

impl Drop for Ticket {
	fn drop(&mut self) {
		if !self.settled {
			// Never settled: the increment stays, the call reads as running forever.
			tracing::debug!(state = %self.state.config().label, function = %self.function, "loader.abandoned");
		}
	}
}

pin_project! {
	/// Future returned by a tracked call.
	///
	/// Records the completion once the inner future resolves, then yields its
	/// output unchanged. A panic from the inner future is recorded as a
	/// completion as well, and keeps unwinding.
	#[must_use = "futures do nothing unless you `.await` or poll them"]
	pub struct Tracked<F> {
		#[pin]
		inner: F,
		ticket: Option<Ticket>,
	}
}

impl<F> Tracked<F> {
	/// Returns `true` while this call still holds its increment.
	pub fn is_tracking(&self) -> bool {
		self.ticket.is_some()
	}
}

impl<F: Future> Future for Tracked<F> {
	type Output = F::Output;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let mut inner = this.inner;
		let polled = panic::catch_unwind(AssertUnwindSafe(|| inner.as_mut().poll(cx)));

		let output = match polled {
			Ok(Poll::Pending) => return Poll::Pending,
			Ok(Poll::Ready(output)) => output,
			Err(payload) => {
				if let Some(mut ticket) = this.ticket.take()
					&& let Err(error) = ticket.settle()
				{
					tracing::error!(state = %ticket.state.config().label, function = %ticket.function, %error, "loader.settle_failed");
				}
				panic::resume_unwind(payload);
			}
		};

		if let Some(mut ticket) = this.ticket.take()
			&& let Err(error) = ticket.settle()
		{
			panic!("in-flight bookkeeping for {} is corrupt: {error}", ticket.function);
		}
		Poll::Ready(output)
	}
}

impl<F> fmt::Debug for Tracked<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tracked")
			.field("function", &self.ticket.as_ref().map(|ticket| ticket.function.name()))
			.finish_non_exhaustive()
	}
}

/// A function wrapped so its calls are counted in a [`LoaderState`].
///
/// Calling it invokes the wrapped function with the same arguments. Futures
/// are counted from the call until they resolve; [`Immediate`] results are
/// not counted at all.
pub struct Loader<F, A> {
	state: LoaderState,
	tracked: TrackedFn,
	enabled: bool,
	f: F,
	_args: PhantomData<fn(A)>,
}

impl<F, A: ArgTuple> Loader<F, A> {
	pub(crate) fn new(state: LoaderState, tracked: TrackedFn, f: F, enabled: bool) -> Self {
		debug_assert_eq!(tracked.arity(), A::ARITY, "tracked arity must match the argument tuple");
		Self {
			state,
			tracked,
			enabled,
			f,
			_args: PhantomData,
		}
	}

	/// Calls the wrapped function.
	pub fn call<R>(&self, args: A) -> R::Output
	where
		F: Fn(A) -> R,
		R: Invocation,
	{
		let keys = self.enabled.then(|| args.arg_keys());
		let result = (self.f)(args);
		let start = keys.map(|args| Start {
			state: &self.state,
			function: &self.tracked,
			args,
		});
		result.into_output(start)
	}

	/// Identity used as this function's registry key.
	pub fn tracked(&self) -> &TrackedFn {
		&self.tracked
	}

	/// Name of the wrapped function.
	pub fn name(&self) -> &str {
		self.tracked.name()
	}

	/// Returns `false` for members left untracked by a registrar override.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Shorthand for [`LoaderState::get_loader`] on this function.
	pub fn is_loading(&self, args: Option<&[QueryArg]>) -> Result<bool> {
		self.state.get_loader(&self.tracked, args)
	}

	pub fn state(&self) -> &LoaderState {
		&self.state
	}
}

impl<F: Clone, A> Clone for Loader<F, A> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			tracked: self.tracked.clone(),
			enabled: self.enabled,
			f: self.f.clone(),
			_args: PhantomData,
		}
	}
}

impl<F, A> fmt::Debug for Loader<F, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Loader")
			.field("function", &self.tracked)
			.field("enabled", &self.enabled)
			.finish_non_exhaustive()
	}
}

impl LoaderState {
	/// Wraps `f` under a fresh identity named `name`.
	///
	/// The arity is the length of `f`'s argument tuple.
	pub fn wrap<F, A, R>(&self, name: &str, f: F) -> Loader<F, A>
	where
		F: Fn(A) -> R,
		A: ArgTuple,
		R: Invocation,
	{
		Loader::new(self.clone(), TrackedFn::new(name, A::ARITY), f, true)
	}

	/// Wraps `f` under a name identity shared with every function of that name.
	pub fn wrap_named<F, A, R>(&self, name: &str, f: F) -> Loader<F, A>
	where
		F: Fn(A) -> R,
		A: ArgTuple,
		R: Invocation,
	{
		Loader::new(self.clone(), TrackedFn::named(name, A::ARITY), f, true)
	}
}
