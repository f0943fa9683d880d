//! In-flight call tracking for async functions.
//!
//! A [`LoaderState`] counts, per tracked function and per argument tuple, how
//! many calls are currently running. Queries answer "is this function running",
//! either for exact arguments, for all calls, or with [`WILDCARD`] positions
//! that aggregate over one argument while holding the others fixed.
//!
//! Counters are stored in an [`inflight_path_store::PathStore`] at
//! `[function, arg0, arg1, ...]`. Argument tuples are padded to the declared
//! arity with [`ArgKey::Unset`], so `f(1)` and `f(1, None)` share a counter.
//!
//! ```
//! use inflight_loader::{LoaderState, WILDCARD, query};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let state = LoaderState::new();
//! let fetch = state.wrap("fetch", |(user, page): (u32, u32)| async move { user + page });
//!
//! let pending = fetch.call((7, 1));
//! assert!(fetch.is_loading(Some(&query![7, 1])).unwrap());
//! assert!(fetch.is_loading(Some(&query![WILDCARD, 1])).unwrap());
//! assert!(!fetch.is_loading(Some(&query![8, WILDCARD])).unwrap());
//!
//! assert_eq!(pending.await, 8);
//! assert!(!fetch.is_loading(None).unwrap());
//! # }
//! ```
//!
//! Only deferred work is counted: a wrapped function returning [`Immediate`]
//! never touches the state. Counters never go below zero; an unmatched
//! completion is reported as [`LoaderError::Underflow`].

mod args;
mod config;
mod error;
mod function;
mod key;
mod observe;
mod registrar;
mod state;
mod wrap;

pub use args::ArgTuple;
pub use config::{ExcessArgs, LoaderConfig};
pub use error::{LoaderError, Result};
pub use function::{FnIdentity, TrackedFn};
pub use key::{ArgKey, FloatKey, IntoArgKey, IntoQueryArg, QueryArg, RefKey, WILDCARD, Wildcard};
pub use observe::{LoaderChange, Subscription};
pub use registrar::Registrar;
pub use state::LoaderState;
pub use wrap::{Immediate, Invocation, Loader, Start, Tracked};
