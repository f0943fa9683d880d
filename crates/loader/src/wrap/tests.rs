use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::oneshot;

use super::*;
use crate::{FnIdentity, WILDCARD, query};

#[tokio::test]
async fn tracks_future_until_it_resolves() {
	let state = LoaderState::new();
	let f = state.wrap("f", |(): ()| async {});

	let pending = f.call(());
	assert!(f.is_loading(Some(&[])).unwrap());
	assert!(pending.is_tracking());

	pending.await;
	assert!(!f.is_loading(Some(&[])).unwrap());
}

#[tokio::test]
async fn forwards_errors_unchanged() {
	let state = LoaderState::new();
	let f = state.wrap("f", |(code,): (u16,)| async move { Err::<(), _>(format!("failed with {code}")) });

	let pending = f.call((500,));
	assert!(f.is_loading(Some(&query![500])).unwrap());

	assert_eq!(pending.await, Err("failed with 500".to_string()));
	assert!(!f.is_loading(None).unwrap());
}

#[tokio::test]
async fn forwards_values_unchanged() {
	let state = LoaderState::new();
	let f = state.wrap("double", |(n,): (i64,)| async move { n * 2 });

	assert_eq!(f.call((21,)).await, 42);
	assert_eq!(state.count(f.tracked(), &crate::arg_keys![21]), Ok(0));
}

#[test]
fn immediate_results_never_touch_state() {
	let state = LoaderState::new();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let f = state.wrap("sync", move |(n,): (u32,)| {
		counter.fetch_add(1, Ordering::SeqCst);
		Immediate(n + 1)
	});

	assert_eq!(f.call((1,)), 2);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(state.is_empty());
}

#[tokio::test]
async fn waits_for_deferred_completion() {
	let state = LoaderState::new();
	let (tx, rx) = oneshot::channel::<u32>();
	let rx = Arc::new(parking_lot::Mutex::new(Some(rx)));
	let f = state.wrap("recv", move |(): ()| {
		let rx = rx.lock().take();
		async move {
			match rx {
				Some(rx) => rx.await.ok(),
				None => None,
			}
		}
	});

	let handle = tokio::spawn(f.call(()));
	tokio::task::yield_now().await;
	assert!(f.is_loading(None).unwrap());

	tx.send(7).unwrap();
	assert_eq!(handle.await.unwrap(), Some(7));
	assert!(!f.is_loading(None).unwrap());
}

#[tokio::test]
async fn overlapping_calls_keep_loading_until_last_finishes() {
	let state = LoaderState::new();
	let f = state.wrap("f", |(_n, _s): (i32, &'static str)| async {});

	let first = f.call((1, "a"));
	let second = f.call((1, "a"));
	assert_eq!(state.count(f.tracked(), &crate::arg_keys![1, "a"]), Ok(2));

	first.await;
	assert!(f.is_loading(Some(&query![1, "a"])).unwrap());

	second.await;
	assert!(!f.is_loading(Some(&query![1, "a"])).unwrap());
}

#[tokio::test]
async fn omitted_option_arguments_share_counters() {
	let state = LoaderState::new();
	let f = state.wrap("f", |(_id, _page): (u32, Option<u32>)| async {});

	let pending = f.call((1, None));
	assert!(f.is_loading(Some(&query![1])).unwrap());
	assert!(f.is_loading(Some(&query![1, ArgKey::Unset])).unwrap());
	assert!(f.is_loading(Some(&query![WILDCARD, None::<u32>])).unwrap());
	assert!(!f.is_loading(Some(&query![1, 2])).unwrap());
	pending.await;
}

#[tokio::test]
async fn panics_settle_the_counter_and_keep_unwinding() {
	let state = LoaderState::new();
	let f = state.wrap("boom", |(): ()| async {
		panic!("boom");
	});

	let err = tokio::spawn(f.call(())).await.unwrap_err();
	assert!(err.is_panic());
	assert!(!f.is_loading(None).unwrap());
}

#[test]
fn abandoned_calls_stay_loading() {
	let state = LoaderState::new();
	let f = state.wrap("f", |(): ()| async {});

	drop(f.call(()));
	assert!(f.is_loading(None).unwrap());
}

#[test]
fn wrapper_exposes_wrapped_identity() {
	let state = LoaderState::new();
	let f = state.wrap("fetch_user", |(_id,): (u64,)| async {});
	let g = state.wrap_named("fetch_user", |(_id,): (u64,)| async {});

	assert_eq!(f.name(), "fetch_user");
	assert_eq!(f.tracked().arity(), 1);
	assert!(matches!(f.tracked().identity(), FnIdentity::Handle(_)));
	assert_eq!(g.tracked().identity(), &FnIdentity::Name("fetch_user".into()));
}

#[test]
fn untracked_loader_passes_calls_through() {
	let state = LoaderState::new();
	let mut registrar = state.registrar().override_member("quiet", false);
	let quiet = registrar.member("quiet", |(): ()| async {});
	let loud = registrar.member("loud", |(): ()| async {});

	let a = quiet.call(());
	let b = loud.call(());

	assert!(!a.is_tracking());
	assert!(b.is_tracking());
	assert!(!quiet.is_loading(None).unwrap());
	assert!(loud.is_loading(None).unwrap());
	assert!(registrar.is_tracked("loud"));
	assert!(!registrar.is_tracked("quiet"));
}

#[test]
fn nested_groups_track_their_members() {
	let state = LoaderState::new();
	let mut registrar = state.registrar().override_member("cache", false);
	let fetch = registrar.member("fetch", |(): ()| async {});
	let (child, warm) = registrar.group("child", |child| {
		let fetch = child.member("fetch", |(): ()| async {});
		let warm = child.group("cache", |cache| cache.member("warm", |(): ()| async {}));
		(fetch, warm)
	});
	let skipped = registrar.group("cache", |cache| cache.member("warm", |(): ()| async {}));

	let a = fetch.call(());
	let b = child.call(());
	let c = warm.call(());
	let d = skipped.call(());

	assert_eq!(child.name(), "child.fetch");
	assert_eq!(warm.name(), "child.cache.warm");
	assert!(fetch.is_loading(None).unwrap());
	assert!(child.is_loading(None).unwrap());
	assert!(warm.is_loading(None).unwrap());
	assert!(c.is_tracking());

	assert!(!skipped.is_enabled());
	assert!(!d.is_tracking());
	assert!(!skipped.is_loading(None).unwrap());

	assert!(registrar.is_tracked("child.fetch"));
	assert!(registrar.is_tracked("child.cache.warm"));
	assert!(!registrar.is_tracked("cache.warm"));
	assert_eq!(registrar.tracked().len(), 3);
	drop((a, b));
}
