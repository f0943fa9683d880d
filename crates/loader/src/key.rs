//! Argument keys and query arguments.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::function::FnIdentity;

/// One positional argument as stored in the loader tree.
///
/// Primitives compare by value. [`ArgKey::Ref`] compares by pointer identity,
/// so two distinct objects with equal contents never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgKey {
	/// Omitted argument; also used to pad tuples to the declared arity.
	Unset,
	Bool(bool),
	/// Any integer, widened without loss.
	Int(i128),
	Float(FloatKey),
	Str(Arc<str>),
	Ref(RefKey),
}

impl ArgKey {
	/// Identity key for a shared object.
	pub fn by_ref<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
		Self::Ref(RefKey::new(value))
	}
}

/// Float compared by bit pattern, with `-0.0 == 0.0` and all NaNs equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatKey(u64);

impl FloatKey {
	pub fn new(value: f64) -> Self {
		let canonical = if value == 0.0 {
			0.0
		} else if value.is_nan() {
			f64::NAN
		} else {
			value
		};
		Self(canonical.to_bits())
	}

	pub fn get(self) -> f64 {
		f64::from_bits(self.0)
	}
}

/// Shared object keyed by its address.
///
/// The key holds a strong reference, so the address cannot be reused while the
/// key is stored.
#[derive(Clone)]
pub struct RefKey(Arc<dyn Any + Send + Sync>);

impl RefKey {
	pub fn new<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
		let erased: Arc<dyn Any + Send + Sync> = value.clone();
		Self(erased)
	}

	/// Returns the referenced object if it has type `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref()
	}

	fn addr(&self) -> *const () {
		Arc::as_ptr(&self.0) as *const ()
	}
}

impl PartialEq for RefKey {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.addr(), other.addr())
	}
}

impl Eq for RefKey {}

impl Hash for RefKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

impl fmt::Debug for RefKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Ref({:p})", self.addr())
	}
}

/// Conversion into an [`ArgKey`].
pub trait IntoArgKey {
	fn into_arg_key(self) -> ArgKey;
}

impl IntoArgKey for ArgKey {
	fn into_arg_key(self) -> ArgKey {
		self
	}
}

impl IntoArgKey for () {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Unset
	}
}

impl IntoArgKey for bool {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Bool(self)
	}
}

macro_rules! impl_int_arg_key {
	($($ty:ty),*) => {
		$(
			impl IntoArgKey for $ty {
				fn into_arg_key(self) -> ArgKey {
					ArgKey::Int(self as i128)
				}
			}
		)*
	};
}

impl_int_arg_key!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl IntoArgKey for f32 {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Float(FloatKey::new(f64::from(self)))
	}
}

impl IntoArgKey for f64 {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Float(FloatKey::new(self))
	}
}

impl IntoArgKey for char {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Str(self.to_string().into())
	}
}

impl IntoArgKey for &str {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Str(self.into())
	}
}

impl IntoArgKey for String {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Str(self.into())
	}
}

impl<T: Any + Send + Sync> IntoArgKey for &Arc<T> {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::by_ref(self)
	}
}

impl IntoArgKey for RefKey {
	fn into_arg_key(self) -> ArgKey {
		ArgKey::Ref(self)
	}
}

impl<T: IntoArgKey> IntoArgKey for Option<T> {
	fn into_arg_key(self) -> ArgKey {
		self.map_or(ArgKey::Unset, IntoArgKey::into_arg_key)
	}
}

/// Query token matching every argument at its position.
///
/// The only instance is [`WILDCARD`]; it is not an [`ArgKey`], so no real
/// argument can be mistaken for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wildcard {
	_sealed: (),
}

/// Matches any argument at this position in a loader query.
pub const WILDCARD: Wildcard = Wildcard { _sealed: () };

/// One position of a loader query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryArg {
	Exact(ArgKey),
	Wildcard,
}

/// Conversion into a [`QueryArg`]; implemented for every [`IntoArgKey`] and [`Wildcard`].
pub trait IntoQueryArg {
	fn into_query_arg(self) -> QueryArg;
}

impl<T: IntoArgKey> IntoQueryArg for T {
	fn into_query_arg(self) -> QueryArg {
		QueryArg::Exact(self.into_arg_key())
	}
}

impl IntoQueryArg for Wildcard {
	fn into_query_arg(self) -> QueryArg {
		QueryArg::Wildcard
	}
}

impl IntoQueryArg for QueryArg {
	fn into_query_arg(self) -> QueryArg {
		self
	}
}

/// Builds a `Vec<ArgKey>` from heterogeneous arguments.
///
/// ```
/// use inflight_loader::{ArgKey, arg_keys};
///
/// assert_eq!(arg_keys![1, "a"], vec![ArgKey::Int(1), ArgKey::Str("a".into())]);
/// ```
#[macro_export]
macro_rules! arg_keys {
	($($arg:expr),* $(,)?) => {
		::std::vec![$($crate::IntoArgKey::into_arg_key($arg)),*]
	};
}

/// Builds a `Vec<QueryArg>` from arguments and [`WILDCARD`]s.
///
/// ```
/// use inflight_loader::{QueryArg, WILDCARD, query};
///
/// let q = query![WILDCARD, "b"];
/// assert_eq!(q[0], QueryArg::Wildcard);
/// ```
#[macro_export]
macro_rules! query {
	($($arg:expr),* $(,)?) => {
		::std::vec![$($crate::IntoQueryArg::into_query_arg($arg)),*]
	};
}

/// Key at one level of the loader tree: the function first, then its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PathKey {
	Function(FnIdentity),
	Arg(ArgKey),
}
