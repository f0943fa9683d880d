use std::collections::VecDeque;
use std::sync::Arc;

use inflight_loader::{
	ArgKey, ExcessArgs, Immediate, LoaderConfig, LoaderError, LoaderState, TrackedFn, WILDCARD, arg_keys, query,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn async_call_reads_loading_until_awaited() {
	init_tracing();
	let state = LoaderState::new();
	let f = state.wrap("f", |(): ()| async {});

	let pending = f.call(());
	assert!(state.get_loader(f.tracked(), Some(&[])).unwrap());

	pending.await;
	assert!(!state.get_loader(f.tracked(), Some(&[])).unwrap());
}

#[tokio::test]
async fn overlapping_calls_with_equal_arguments() {
	init_tracing();
	let state = LoaderState::new();
	let gates = Arc::new(Mutex::new(VecDeque::<oneshot::Receiver<()>>::new()));
	let queue = Arc::clone(&gates);
	let f = state.wrap("f", move |(_n, _s): (i32, &'static str)| {
		let gate = queue.lock().pop_front();
		async move {
			if let Some(gate) = gate {
				let _ = gate.await;
			}
		}
	});

	let (open_first, first_gate) = oneshot::channel::<()>();
	let (open_second, second_gate) = oneshot::channel::<()>();
	gates.lock().extend([first_gate, second_gate]);

	let first = tokio::spawn(f.call((1, "a")));
	let second = tokio::spawn(f.call((1, "a")));
	assert_eq!(state.running(f.tracked(), Some(&query![1, "a"])), Ok(2));

	open_first.send(()).unwrap();
	first.await.unwrap();
	assert!(f.is_loading(Some(&query![1, "a"])).unwrap());

	open_second.send(()).unwrap();
	second.await.unwrap();
	assert!(!f.is_loading(Some(&query![1, "a"])).unwrap());
}

#[tokio::test]
async fn failure_reverts_counter_and_propagates() {
	init_tracing();
	let state = LoaderState::new();
	let f = state.wrap("load", |(id,): (u32,)| async move {
		if id == 0 {
			Err(format!("no such record: {id}"))
		} else {
			Ok(id)
		}
	});

	let failing = f.call((0,));
	let passing = f.call((1,));
	assert!(f.is_loading(Some(&query![WILDCARD])).unwrap());

	assert_eq!(failing.await, Err("no such record: 0".to_string()));
	assert!(!f.is_loading(Some(&query![0])).unwrap());
	assert!(f.is_loading(None).unwrap());

	assert_eq!(passing.await, Ok(1));
	assert!(!f.is_loading(None).unwrap());
}

#[test]
fn synchronous_results_leave_state_untouched() {
	init_tracing();
	let state = LoaderState::new();
	let f = state.wrap("len", |(s,): (&'static str,)| Immediate(s.len()));

	assert_eq!(f.call(("four",)), 4);
	assert!(state.is_empty());
	assert!(!f.is_loading(None).unwrap());
}

#[test]
fn wildcard_aggregation_over_first_argument() {
	init_tracing();
	let state = LoaderState::new();
	let f = TrackedFn::new("f", 2);

	state.set_loader(&f, &arg_keys![1, "b"], true).unwrap();
	state.set_loader(&f, &arg_keys![4, "b"], true).unwrap();
	state.set_loader(&f, &arg_keys![1, "c"], true).unwrap();
	state.set_loader(&f, &arg_keys![1, "c"], false).unwrap();

	assert!(state.get_loader(&f, Some(&query![WILDCARD, "b"])).unwrap());
	assert!(!state.get_loader(&f, Some(&query![WILDCARD, "c"])).unwrap());
	assert!(state.get_loader(&f, None).unwrap());
}

#[test]
fn padded_and_explicit_placeholder_share_a_counter() {
	init_tracing();
	let state = LoaderState::new();
	let f = TrackedFn::new("f", 2);

	state.set_loader(&f, &arg_keys![1], true).unwrap();
	assert!(state.get_loader(&f, Some(&query![1, ArgKey::Unset])).unwrap());

	state.set_loader(&f, &arg_keys![1, ArgKey::Unset], false).unwrap();
	assert!(!state.get_loader(&f, Some(&query![1])).unwrap());
}

#[test]
fn unmatched_completion_is_a_consistency_failure() {
	init_tracing();
	let state = LoaderState::new();
	let f = TrackedFn::new("f", 0);

	let err = state.set_loader(&f, &[], false).unwrap_err();
	assert!(matches!(err, LoaderError::Underflow { .. }));
	assert_eq!(state.count(&f, &[]), Ok(0));
	assert!(state.is_empty());
}

#[test]
fn excess_arguments_follow_configured_policy() {
	init_tracing();
	let strict = LoaderState::new();
	let lenient = LoaderState::with_config(LoaderConfig::default().with_excess_args(ExcessArgs::Truncate));
	let f = TrackedFn::new("f", 1);

	assert_eq!(
		strict.set_loader(&f, &arg_keys![1, 2], true),
		Err(LoaderError::ArityExceeded {
			function: "f".to_string(),
			arity: 1,
			given: 2,
		})
	);
	assert_eq!(lenient.set_loader(&f, &arg_keys![1, 2], true), Ok(1));
	assert!(lenient.get_loader(&f, Some(&query![1])).unwrap());
}

#[tokio::test]
async fn reactions_follow_wrapped_calls() {
	init_tracing();
	let state = LoaderState::new();
	let f = state.wrap("f", |(_id,): (u32,)| async {});
	let history = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&history);
	state
		.react(f.tracked(), Some(query![3]), move |loading| sink.lock().push(loading))
		.unwrap();

	let other = f.call((4,));
	let mine = f.call((3,));
	other.await;
	mine.await;

	assert_eq!(*history.lock(), vec![false, true, false]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_balance_out() {
	init_tracing();
	let state = LoaderState::new();
	let f = state.wrap("tick", |(n,): (u32,)| async move {
		tokio::task::yield_now().await;
		n
	});

	let handles: Vec<_> = (0..64).map(|n| tokio::spawn(f.call((n % 4,)))).collect();
	for handle in handles {
		handle.await.unwrap();
	}

	assert!(!f.is_loading(None).unwrap());
	for n in 0..4u32 {
		assert_eq!(state.count(f.tracked(), &arg_keys![n]), Ok(0));
	}
}
