//! Error types for path store writes.

use thiserror::Error;

/// Malformed writes into a [`PathStore`](crate::PathStore).
///
/// Lookups never fail; a missing key is reported as `None` or an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathStoreError {
	/// A write was attempted with no keys at all.
	#[error("path must contain at least one key")]
	EmptyPath,

	/// The path tried to descend through a terminal value.
	#[error("path descends through a terminal value at depth {depth}")]
	TerminalInPath {
		/// Index of the key that holds the terminal.
		depth: usize,
	},
}
