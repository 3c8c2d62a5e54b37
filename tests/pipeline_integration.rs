//! End-to-end pipelines mixing sources, operators, subjects and schedulers.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};

use rxcombine::prelude::*;

fn recording_requests<Item, Err>() -> (EventHooks<Item, Err>, Arc<Mutex<Vec<Demand>>>) {
  let requests = Arc::new(Mutex::new(vec![]));
  let r = requests.clone();
  (EventHooks::new().on_request(move |d| r.lock().unwrap().push(d)), requests)
}

#[rxcombine_macro::test]
fn chain_of_operators_respects_bounded_demand() {
  let (probe, handle) = Probe::new(Demand::max(3));
  from_iter(1..=100)
    .map(|v| v * 2)
    .filter(|v| v % 3 == 0)
    .scan(0, |acc, v| acc + v)
    .subscribe(probe);

  assert_eq!(handle.values(), vec![6, 18, 36]);
  assert!(!handle.is_terminated());

  handle.request(Demand::max(2));
  assert_eq!(handle.values(), vec![6, 18, 36, 60, 90]);
  assert_eq!(handle.outstanding(), Demand::NONE);
}

#[rxcombine_macro::test]
fn filter_asks_upstream_for_a_replacement() {
  let (hooks, requests) = recording_requests();
  let (probe, handle) = Probe::new(Demand::max(1));
  from_iter(vec![1, 3, 5, 6]).handle_events(hooks).filter(|v| v % 2 == 0).subscribe(probe);

  assert_eq!(handle.values(), vec![6]);
  assert_eq!(*requests.lock().unwrap(), vec![Demand::max(1)]);
}

#[rxcombine_macro::test]
fn take_cancels_an_infinite_source() {
  let cancelled = Arc::new(AtomicUsize::new(0));
  let c = cancelled.clone();
  let (probe, handle) = Probe::unlimited();
  from_iter(0..)
    .handle_events(EventHooks::new().on_cancel(move || {
      c.fetch_add(1, Ordering::SeqCst);
    }))
    .take(4)
    .subscribe(probe);

  assert_eq!(handle.values(), vec![0, 1, 2, 3]);
  assert_eq!(handle.completion(), Some(Completion::Finished));
  assert_eq!(cancelled.load(Ordering::SeqCst), 1);
}

#[rxcombine_macro::test]
fn merge_failure_cancels_the_sibling() {
  let left = PassthroughSubject::<i32, &str>::new();
  let right = PassthroughSubject::<i32, &str>::new();
  let (probe, handle) = Probe::unlimited();
  left.clone().merge(right.clone()).subscribe(probe);
  assert_eq!(right.subscriber_count(), 1);

  left.send(1);
  right.send(2);
  left.send_completion(Completion::Failure("left broke"));

  assert_eq!(handle.values(), vec![1, 2]);
  assert_eq!(handle.completion(), Some(Completion::Failure("left broke")));
  assert_eq!(right.subscriber_count(), 0);
}

#[rxcombine_macro::test]
fn cancel_is_idempotent_and_silences_the_pipeline() {
  let subject = PassthroughSubject::<i32, Never>::new();
  let cancels = Arc::new(AtomicUsize::new(0));
  let c = cancels.clone();
  let seen = Arc::new(Mutex::new(vec![]));
  let s = seen.clone();
  let handle = subject
    .clone()
    .handle_events(EventHooks::new().on_cancel(move || {
      c.fetch_add(1, Ordering::SeqCst);
    }))
    .map(|v| v + 1)
    .sink_value(move |v| s.lock().unwrap().push(v));

  subject.send(1);
  handle.cancel();
  handle.cancel();
  subject.send(2);

  assert_eq!(*seen.lock().unwrap(), vec![2]);
  assert_eq!(cancels.load(Ordering::SeqCst), 1);
  assert!(handle.is_cancelled());
  assert_eq!(subject.subscriber_count(), 0);
}

#[rxcombine_macro::test]
fn current_value_replays_latest_to_late_subscribers() {
  let subject = CurrentValueSubject::<&str, Never>::new("init");
  subject.send("A");

  let (probe, handle) = Probe::unlimited();
  subject.clone().subscribe(probe);
  subject.send("B");

  assert_eq!(handle.values(), vec!["A", "B"]);
  assert_eq!(subject.value(), "B");
}

#[rxcombine_macro::test]
fn passthrough_has_no_memory() {
  let subject = PassthroughSubject::<&str, Never>::new();
  subject.send("lost");

  let (probe, handle) = Probe::unlimited();
  subject.clone().subscribe(probe);
  subject.send("kept");

  assert_eq!(handle.values(), vec!["kept"]);
}

#[rxcombine_macro::test]
fn receive_on_preserves_order_under_virtual_time() {
  let scheduler = TestScheduler::new();
  let (probe, handle) = Probe::unlimited();
  from_iter(1..=5).map(|v| v * 10).receive_on(scheduler.clone()).subscribe(probe);

  assert!(handle.values().is_empty());
  scheduler.flush();
  assert_eq!(handle.values(), vec![10, 20, 30, 40, 50]);
  assert_eq!(handle.completion(), Some(Completion::Finished));
}

#[rxcombine_macro::test]
fn flat_map_then_collect() {
  let (probe, handle) = Probe::unlimited();
  from_iter(1..=3)
    .flat_map(Demand::Unlimited, |v| from_iter(0..v))
    .collect()
    .subscribe(probe);

  let values = handle.values();
  assert_eq!(values.len(), 1);
  let mut collected = values[0].clone();
  collected.sort_unstable();
  assert_eq!(collected, vec![0, 0, 0, 1, 1, 2]);
}

#[rxcombine_macro::test]
fn retry_then_catch_recovers() {
  let attempts = Arc::new(AtomicUsize::new(0));
  let a = attempts.clone();
  let (probe, handle) = Probe::unlimited();
  deferred(move || {
    a.fetch_add(1, Ordering::SeqCst);
    fail::<i32, &str>("down")
  })
  .retry(2)
  .catch(|_| just(-1))
  .subscribe(probe);

  assert_eq!(attempts.load(Ordering::SeqCst), 3);
  assert_eq!(handle.values(), vec![-1]);
  assert_eq!(handle.completion(), Some(Completion::Finished));
}

#[cfg(feature = "futures-scheduler")]
#[rxcombine_macro::test]
fn thread_hops_deliver_every_value_in_order() {
  use std::sync::mpsc;

  let pool = ThreadPoolScheduler::builder().pool_size(4).build().unwrap();
  let (tx, rx) = mpsc::channel();
  let done = tx.clone();
  let _handle = from_iter(0..200)
    .subscribe_on(pool.clone())
    .receive_on(pool)
    .sink(
      move |_| {
        let _ = done.send(None);
      },
      move |v| {
        let _ = tx.send(Some(v));
      },
    );

  let mut seen = vec![];
  while let Some(v) = rx.recv_timeout(Duration::from_secs(5)).unwrap() {
    seen.push(v);
  }
  assert_eq!(seen, (0..200).collect::<Vec<_>>());
}

#[cfg(feature = "tokio-scheduler")]
#[rxcombine_macro::test(multi)]
async fn stream_bridge_on_tokio() {
  use futures::StreamExt;

  let scheduler = TokioScheduler::try_current().unwrap();
  let mut stream = interval(Duration::from_millis(1), scheduler).take(3).collect().into_stream();
  let values = stream.next().await.unwrap().unwrap();
  assert!(stream.next().await.is_none());
  assert_eq!(values, vec![0, 1, 2]);
}
