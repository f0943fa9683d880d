//! Error types for loader bookkeeping.

use inflight_path_store::PathStoreError;
use thiserror::Error;

use crate::ArgKey;

/// Errors raised by [`LoaderState`](crate::LoaderState) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
	/// A completion was recorded without a matching start.
	///
	/// This is a bookkeeping bug in the caller, never a runtime condition.
	#[error("running counter for {function} {args:?} would drop below zero")]
	Underflow {
		/// Name of the tracked function.
		function: String,
		/// Padded argument keys of the unbalanced call.
		args: Vec<ArgKey>,
	},

	/// More arguments were given than the function declares.
	#[error("{function} declares {arity} argument(s) but {given} were given")]
	ArityExceeded {
		/// Name of the tracked function.
		function: String,
		/// Declared arity.
		arity: usize,
		/// Number of arguments supplied.
		given: usize,
	},

	/// The function identity is already stored with a different arity.
	#[error("{function} is already tracked with a different argument shape")]
	ShapeMismatch {
		/// Name of the tracked function.
		function: String,
	},

	#[error(transparent)]
	Store(#[from] PathStoreError),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
