use crate::{ArgKey, IntoArgKey};

/// Argument tuple of a wrapped function.
///
/// Implemented for tuples of up to eight [`IntoArgKey`] values. The tuple
/// length is the declared arity; `Option` elements passed as `None` store as
/// [`ArgKey::Unset`], matching calls that omit trailing arguments.
pub trait ArgTuple {
	/// Number of positional arguments.
	const ARITY: usize;

	/// Keys for each position, in order.
	fn arg_keys(&self) -> Vec<ArgKey>;
}

macro_rules! impl_arg_tuple {
	($arity:expr; $($name:ident . $idx:tt),*) => {
		impl<$($name: IntoArgKey + Clone),*> ArgTuple for ($($name,)*) {
			const ARITY: usize = $arity;

			fn arg_keys(&self) -> Vec<ArgKey> {
				vec![$(self.$idx.clone().into_arg_key()),*]
			}
		}
	};
}

impl_arg_tuple!(0;);
impl_arg_tuple!(1; A.0);
impl_arg_tuple!(2; A.0, B.1);
impl_arg_tuple!(3; A.0, B.1, C.2);
impl_arg_tuple!(4; A.0, B.1, C.2, D.3);
impl_arg_tuple!(5; A.0, B.1, C.2, D.3, E.4);
impl_arg_tuple!(6; A.0, B.1, C.2, D.3, E.4, F.5);
impl_arg_tuple!(7; A.0, B.1, C.2, D.3, E.4, F.5, G.6);
impl_arg_tuple!(8; A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
