//! Loader state configuration.

use serde::Deserialize;

/// Settings for a [`LoaderState`](crate::LoaderState).
///
/// Deserializes from kebab-case keys; every field is optional:
///
/// ```
/// use inflight_loader::{ExcessArgs, LoaderConfig};
///
/// let config: LoaderConfig = serde_json::from_str(r#"{ "excess-args": "truncate" }"#).unwrap();
/// assert_eq!(config.excess_args, ExcessArgs::Truncate);
/// assert_eq!(config.label, "loader");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
	/// Name attached to tracing events emitted by this state.
	pub label: String,
	/// Handling of argument tuples longer than the declared arity.
	pub excess_args: ExcessArgs,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			label: "loader".to_string(),
			excess_args: ExcessArgs::default(),
		}
	}
}

impl LoaderConfig {
	/// Sets the tracing label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Sets the excess argument policy.
	pub fn with_excess_args(mut self, policy: ExcessArgs) -> Self {
		self.excess_args = policy;
		self
	}
}

/// Policy for argument tuples longer than a function's declared arity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExcessArgs {
	/// Fail with [`LoaderError::ArityExceeded`](crate::LoaderError::ArityExceeded).
	#[default]
	Reject,
	/// Drop the trailing arguments beyond the declared arity.
	Truncate,
}
