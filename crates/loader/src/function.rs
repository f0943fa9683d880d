use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of unique function handles.
static HANDLES: AtomicU64 = AtomicU64::new(0);

fn next_handle() -> u64 {
	HANDLES.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Identity under which a tracked function's counters are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FnIdentity {
	/// Unique handle; functions sharing a name stay distinct.
	Handle(u64),
	/// Name string; every function with this name shares counters.
	Name(Arc<str>),
}

/// A unit of work whose in-flight calls are counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedFn {
	identity: FnIdentity,
	name: Arc<str>,
	arity: usize,
}

impl TrackedFn {
	/// Creates a function with a fresh unique identity.
	pub fn new(name: impl Into<Arc<str>>, arity: usize) -> Self {
		Self {
			identity: FnIdentity::Handle(next_handle()),
			name: name.into(),
			arity,
		}
	}

	/// Creates a function identified by its name alone.
	pub fn named(name: impl Into<Arc<str>>, arity: usize) -> Self {
		let name = name.into();
		Self {
			identity: FnIdentity::Name(Arc::clone(&name)),
			name,
			arity,
		}
	}

	pub fn identity(&self) -> &FnIdentity {
		&self.identity
	}

	/// Debug name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared number of positional arguments.
	pub const fn arity(&self) -> usize {
		self.arity
	}
}

impl fmt::Display for TrackedFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}
