use std::collections::HashMap;

use crate::{ArgTuple, Invocation, Loader, LoaderState, TrackedFn};

/// Explicit registration of a group of tracked members.
///
/// Each member is wrapped by name. Names overridden to `false` are still
/// wrapped, but their calls pass straight through without touching the state.
/// Nested groups qualify their members as `group.member`; overriding a group
/// name to `false` leaves every member below it untracked.
///
/// ```
/// use inflight_loader::{Immediate, LoaderState};
///
/// let state = LoaderState::new();
/// let mut registrar = state.registrar().override_member("len", false);
/// let fetch = registrar.member("fetch", |(id,): (u32,)| async move { id });
/// let len = registrar.member("len", |(): ()| Immediate(3));
///
/// assert!(fetch.is_enabled());
/// assert!(!len.is_enabled());
/// assert_eq!(registrar.tracked().len(), 1);
///
/// let child = registrar.group("child", |child| child.member("fetch", |(): ()| async {}));
/// assert_eq!(child.name(), "child.fetch");
/// assert!(registrar.is_tracked("child.fetch"));
/// ```
#[derive(Debug)]
pub struct Registrar {
	state: LoaderState,
	overrides: HashMap<String, bool>,
	tracked: Vec<TrackedFn>,
	prefix: Option<String>,
	enabled: bool,
}

impl Registrar {
	pub(crate) fn new(state: LoaderState) -> Self {
		Self {
			state,
			overrides: HashMap::new(),
			tracked: Vec::new(),
			prefix: None,
			enabled: true,
		}
	}

	/// Forces tracking on or off for the member or group called `name`.
	///
	/// Members of nested groups are addressed by their qualified name.
	pub fn override_member(mut self, name: impl Into<String>, enabled: bool) -> Self {
		self.overrides.insert(name.into(), enabled);
		self
	}

	/// Wraps one member.
	pub fn member<F, A, R>(&mut self, name: &str, f: F) -> Loader<F, A>
	where
		F: Fn(A) -> R,
		A: ArgTuple,
		R: Invocation,
	{
		let name = self.qualify(name);
		let enabled = self.allows(&name);
		let tracked = TrackedFn::new(name, A::ARITY);
		if enabled {
			self.tracked.push(tracked.clone());
		} else {
			tracing::debug!(state = %self.state.config().label, function = %tracked, "loader.registrar.skip");
		}
		Loader::new(self.state.clone(), tracked, f, enabled)
	}

	/// Registers a nested group of members through `build`.
	///
	/// The group shares this registrar's state and overrides. Its tracked
	/// members are recorded here as well once `build` returns.
	pub fn group<T>(&mut self, name: &str, build: impl FnOnce(&mut Registrar) -> T) -> T {
		let prefix = self.qualify(name);
		let enabled = self.allows(&prefix);
		if !enabled {
			tracing::debug!(state = %self.state.config().label, group = %prefix, "loader.registrar.skip");
		}
		let mut child = Registrar {
			state: self.state.clone(),
			overrides: self.overrides.clone(),
			tracked: Vec::new(),
			prefix: Some(prefix),
			enabled,
		};
		let out = build(&mut child);
		self.tracked.append(&mut child.tracked);
		out
	}

	/// Members registered with tracking enabled, in registration order.
	pub fn tracked(&self) -> &[TrackedFn] {
		&self.tracked
	}

	/// Returns `true` if a member with qualified `name` was registered with tracking on.
	pub fn is_tracked(&self, name: &str) -> bool {
		self.tracked.iter().any(|function| function.name() == name)
	}

	fn qualify(&self, name: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{prefix}.{name}"),
			None => name.to_string(),
		}
	}

	fn allows(&self, qualified: &str) -> bool {
		self.enabled && self.overrides.get(qualified).copied().unwrap_or(true)
	}
}
