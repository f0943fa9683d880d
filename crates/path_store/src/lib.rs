//! Nested mapping addressed by an ordered sequence of keys.
//!
//! A [`PathStore`] is a tree of maps. Every key along a path selects a child;
//! children are either another [`PathStore`] (interior nodes) or a terminal
//! payload. Keys at every level share one type `K`, so heterogeneous keys are
//! expressed as an enum owned by the caller.
//!
//! Children keep insertion order, so multi-match lookups are deterministic.
//!
//! ```
//! use inflight_path_store::{PathStore, Segment};
//!
//! let mut store = PathStore::new();
//! store.deep_set(&["a", "x", "b"], 1).unwrap();
//! store.deep_set(&["a", "y", "b"], 2).unwrap();
//! store.deep_set(&["a", "y", "c"], 3).unwrap();
//!
//! let pattern = [Segment::Key("a"), Segment::Any, Segment::Key("b")];
//! assert_eq!(store.deep_get_with_wildcard(&pattern), vec![&1, &2]);
//! ```

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;

mod error;

pub use error::PathStoreError;

/// Child stored under one key.
#[derive(Debug, Clone)]
pub enum Node<K, V> {
	/// Nested store, addressed by the remaining keys of a path.
	Interior(PathStore<K, V>),
	/// Payload at the end of a fully specified path.
	Terminal(V),
}

/// Borrowed view of a node, including the root store itself.
pub enum NodeRef<'a, K, V> {
	Interior(&'a PathStore<K, V>),
	Terminal(&'a V),
}

impl<'a, K, V> NodeRef<'a, K, V> {
	/// Returns the terminal payload, if this node is one.
	pub fn terminal(self) -> Option<&'a V> {
		match self {
			Self::Terminal(value) => Some(value),
			Self::Interior(_) => None,
		}
	}

	/// Returns the nested store, if this node is one.
	pub fn interior(self) -> Option<&'a PathStore<K, V>> {
		match self {
			Self::Interior(store) => Some(store),
			Self::Terminal(_) => None,
		}
	}

	fn collect_terminals(self, out: &mut Vec<&'a V>) {
		match self {
			Self::Terminal(value) => out.push(value),
			Self::Interior(store) => {
				for child in store.children.values() {
					NodeRef::from(child).collect_terminals(out);
				}
			}
		}
	}
}

impl<K, V> Clone for NodeRef<'_, K, V> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Interior(store) => f.debug_tuple("Interior").field(store).finish(),
			Self::Terminal(value) => f.debug_tuple("Terminal").field(value).finish(),
		}
	}
}

impl<'a, K, V> From<&'a Node<K, V>> for NodeRef<'a, K, V> {
	fn from(node: &'a Node<K, V>) -> Self {
		match node {
			Node::Interior(store) => Self::Interior(store),
			Node::Terminal(value) => Self::Terminal(value),
		}
	}
}

/// One step of a lookup pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment<K> {
	/// Matches exactly this key.
	Key(K),
	/// Matches every key present at this level.
	Any,
}

/// Tree of maps addressed by key paths.
#[derive(Debug, Clone)]
pub struct PathStore<K, V> {
	children: IndexMap<K, Node<K, V>>,
}

impl<K, V> Default for PathStore<K, V> {
	fn default() -> Self {
		Self {
			children: IndexMap::default(),
		}
	}
}

impl<K, V> PathStore<K, V> {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of direct children.
	pub fn len(&self) -> usize {
		self.children.len()
	}

	/// Returns `true` if nothing has ever been written below this store.
	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	/// Iterates direct children in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&K, NodeRef<'_, K, V>)> {
		self.children.iter().map(|(key, node)| (key, NodeRef::from(node)))
	}

	/// Every terminal payload below this store, depth-first.
	pub fn terminals(&self) -> Vec<&V> {
		Self::deep_get_all_terminals([NodeRef::Interior(self)])
	}

	/// Flattens `nodes` into every terminal payload reachable from them.
	///
	/// Terminals are yielded as is; interior nodes are walked depth-first in
	/// insertion order.
	pub fn deep_get_all_terminals<'a, I>(nodes: I) -> Vec<&'a V>
	where
		I: IntoIterator<Item = NodeRef<'a, K, V>>,
		K: 'a,
	{
		let mut out = Vec::new();
		for node in nodes {
			node.collect_terminals(&mut out);
		}
		out
	}
}

impl<K: Hash + Eq, V> PathStore<K, V> {
	/// Writes `value` as the terminal at `path`, creating interior nodes on the way.
	///
	/// Whatever was stored at the final key, value or subtree, is replaced.
	pub fn deep_set(&mut self, path: &[K], value: V) -> Result<(), PathStoreError>
	where
		K: Clone,
	{
		let Some((last, parents)) = path.split_last() else {
			return Err(PathStoreError::EmptyPath);
		};

		let mut store = self;
		for (depth, key) in parents.iter().enumerate() {
			store = match store
				.children
				.entry(key.clone())
				.or_insert_with(|| Node::Interior(PathStore::new()))
			{
				Node::Interior(child) => child,
				Node::Terminal(_) => return Err(PathStoreError::TerminalInPath { depth }),
			};
		}
		store.children.insert(last.clone(), Node::Terminal(value));
		Ok(())
	}

	/// Returns the node at `path`, or `None` once a step misses.
	///
	/// An empty path yields the store itself. Descending into a terminal is a miss.
	pub fn deep_get(&self, path: &[K]) -> Option<NodeRef<'_, K, V>> {
		let mut node = NodeRef::Interior(self);
		for key in path {
			let NodeRef::Interior(store) = node else {
				return None;
			};
			node = store.children.get(key)?.into();
		}
		Some(node)
	}

	/// Returns every terminal reached by a path matching `pattern`.
	///
	/// [`Segment::Any`] expands into all children at its level; exact segments
	/// prune branches that lack the key. Results come back depth-first in
	/// insertion order. Paths that run out of pattern on an interior node, or hit
	/// a terminal before the pattern ends, contribute nothing.
	pub fn deep_get_with_wildcard(&self, pattern: &[Segment<K>]) -> Vec<&V> {
		let mut out = Vec::new();
		self.collect_matches(pattern, &mut out);
		out
	}

	fn collect_matches<'a>(&'a self, pattern: &[Segment<K>], out: &mut Vec<&'a V>) {
		let Some((head, rest)) = pattern.split_first() else {
			return;
		};

		let mut visit = |node: &'a Node<K, V>| match node {
			Node::Terminal(value) if rest.is_empty() => out.push(value),
			Node::Interior(child) if !rest.is_empty() => child.collect_matches(rest, out),
			_ => {}
		};

		match head {
			Segment::Any => self.children.values().for_each(&mut visit),
			Segment::Key(key) => {
				if let Some(node) = self.children.get(key) {
					visit(node);
				}
			}
		}
	}
}
