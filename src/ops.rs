//! Operators and sinks, reached through [`PublisherExt`].
//!
//! Every operator is a publisher wrapping its upstream. Nothing happens until
//! the outermost publisher is subscribed; subscribing then subscribes every
//! stage once, from the subscriber back to the source.

use std::{
  marker::PhantomData,
  sync::{Arc, Mutex},
};

pub mod catch;
pub mod filter;
pub mod filter_map;
pub mod flat_map;
pub mod handle_events;
pub mod into_stream;
pub mod map;
pub mod map_error;
pub mod merge;
pub mod receive_on;
pub mod reduce;
mod relay;
pub mod remove_duplicates;
pub mod retry;
pub mod scan;
pub mod skip;
pub mod subscribe_on;
pub mod take;
pub mod try_map;

pub use catch::{Catch, ReplaceError};
pub use filter::Filter;
pub use filter_map::FilterMap;
pub use flat_map::FlatMap;
pub use handle_events::{EventHooks, HandleEvents};
pub use into_stream::IntoStream;
pub use map::Map;
pub use map_error::{MapError, SetFailureType};
pub use merge::{merge_many, Merge, MergeMany};
pub use receive_on::ReceiveOn;
pub use reduce::{Collect, Reduce};
pub use remove_duplicates::RemoveDuplicates;
pub use retry::{Retry, RetryConfig, RetryPolicy};
pub use scan::Scan;
pub use skip::Skip;
pub use subscribe_on::SubscribeOn;
pub use take::Take;
pub use try_map::TryMap;

use crate::{
  demand::Demand,
  publisher::{just, AnyPublisher, Never, Publisher},
  scheduler::Scheduler,
  subscriber::{Assign, Completion, Sink},
  subscription::Cancellable,
};

fn ignore<E>(_: Completion<E>) {}

/// Operator and sink methods available on every [`Publisher`].
pub trait PublisherExt: Publisher + Sized {
  /// Transform every value with `f`.
  ///
  /// ```rust
  /// use rxcombine::prelude::*;
  ///
  /// let (probe, handle) = Probe::unlimited();
  /// from_iter(1..=3).map(|v| v * 2).subscribe(probe);
  /// assert_eq!(handle.values(), vec![2, 4, 6]);
  /// ```
  #[inline]
  fn map<T, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Output) -> T + Send + 'static,
  {
    Map { source: self, func: f }
  }

  /// Transform every value with a fallible `f`. The first `Err` cancels the
  /// upstream and becomes the failure of the stream.
  ///
  /// The upstream failure must convert into `E`. A publisher that cannot
  /// fail needs [`set_failure_type`](Self::set_failure_type) first:
  ///
  /// ```rust
  /// use rxcombine::prelude::*;
  ///
  /// let (probe, handle) = Probe::unlimited();
  /// from_iter(vec!["1", "x"])
  ///   .set_failure_type::<String>()
  ///   .try_map(|s: &str| s.parse::<i32>().map_err(|e| e.to_string()))
  ///   .subscribe(probe);
  /// assert_eq!(handle.values(), vec![1]);
  /// assert!(handle.is_terminated());
  /// ```
  #[inline]
  fn try_map<T, E, F>(self, f: F) -> TryMap<Self, F, E>
  where
    F: FnMut(Self::Output) -> Result<T, E> + Send + 'static,
    Self::Failure: Into<E>,
  {
    TryMap { source: self, func: f, _p: PhantomData }
  }

  /// Pass on only the values for which `predicate` holds.
  #[inline]
  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Output) -> bool + Send + 'static,
  {
    Filter { source: self, predicate }
  }

  /// Map and filter in one step: `None` drops the value.
  #[inline]
  fn filter_map<T, F>(self, f: F) -> FilterMap<Self, F>
  where
    F: FnMut(Self::Output) -> Option<T> + Send + 'static,
  {
    FilterMap { source: self, func: f }
  }

  /// Emit every intermediate result of folding the values into `initial`.
  #[inline]
  fn scan<Acc, F>(self, initial: Acc, f: F) -> Scan<Self, Acc, F>
  where
    Acc: Clone,
    F: FnMut(Acc, Self::Output) -> Acc + Send + 'static,
  {
    Scan { source: self, initial, func: f }
  }

  /// Emit the first `count` values, then finish and cancel the upstream.
  #[inline]
  fn take(self, count: usize) -> Take<Self> { Take { source: self, count } }

  /// Drop the first `count` values.
  #[inline]
  fn skip(self, count: usize) -> Skip<Self> { Skip { source: self, count } }

  /// Drop values equal to the one delivered just before them.
  #[inline]
  fn remove_duplicates(self) -> RemoveDuplicates<Self>
  where
    Self::Output: PartialEq + Clone,
  {
    RemoveDuplicates { source: self }
  }

  /// Gather every value into a single `Vec`, emitted when the upstream
  /// finishes.
  ///
  /// ```rust
  /// use rxcombine::prelude::*;
  ///
  /// let (probe, handle) = Probe::unlimited();
  /// from_iter(1..=4).collect().subscribe(probe);
  /// assert_eq!(handle.values(), vec![vec![1, 2, 3, 4]]);
  /// ```
  #[inline]
  fn collect(self) -> Collect<Self, Self::Output> {
    Reduce { source: self, initial: Vec::new(), func: reduce::push as fn(_, _) -> _ }
  }

  /// Fold every value into `initial`, emitting only the final result.
  #[inline]
  fn reduce<Acc, F>(self, initial: Acc, f: F) -> Reduce<Self, Acc, F>
  where
    F: FnMut(Acc, Self::Output) -> Acc + Send + 'static,
  {
    Reduce { source: self, initial, func: f }
  }

  /// Run side effects on every protocol event without changing them.
  #[inline]
  fn handle_events(self, hooks: EventHooks<Self::Output, Self::Failure>) -> HandleEvents<Self> {
    HandleEvents { source: self, hooks }
  }

  /// Trace every protocol event at `debug` level under the
  /// `rxcombine::log` target, tagged with `prefix`.
  #[inline]
  fn log(self, prefix: impl Into<Arc<str>>) -> HandleEvents<Self>
  where
    Self::Output: std::fmt::Debug,
    Self::Failure: std::fmt::Debug,
  {
    HandleEvents { source: self, hooks: EventHooks::logging(prefix) }
  }

  /// Translate the failure with `f`.
  #[inline]
  fn map_error<E, F>(self, f: F) -> MapError<Self, F>
  where
    F: FnOnce(Self::Failure) -> E + Send + 'static,
  {
    MapError { source: self, func: f }
  }

  /// Give a publisher that cannot fail the failure type `E`, so it can be
  /// combined with publishers that can.
  #[inline]
  fn set_failure_type<E>(self) -> SetFailureType<Self, E>
  where
    Self: Publisher<Failure = Never>,
  {
    SetFailureType { source: self, _p: PhantomData }
  }

  /// On failure, emit `value` and finish instead.
  #[inline]
  fn replace_error(self, value: Self::Output) -> ReplaceError<Self> {
    Catch { source: self, handler: Box::new(move |_| just(value)) }
  }

  /// On failure, continue with the publisher returned by `handler`.
  ///
  /// Demand the subscriber has not been served yet is requested from the
  /// replacement.
  #[inline]
  fn catch<Q, F>(self, handler: F) -> Catch<Self, F>
  where
    F: FnOnce(Self::Failure) -> Q + Send + 'static,
    Q: Publisher<Output = Self::Output>,
  {
    Catch { source: self, handler }
  }

  /// Re-subscribe after a failure while `policy` allows it. A plain `usize`
  /// is a retry count.
  #[inline]
  fn retry<Pol>(self, policy: Pol) -> Retry<Self, Pol>
  where
    Self: Clone,
    Pol: RetryPolicy<Self::Failure>,
  {
    Retry { source: self, policy }
  }

  /// Interleave the values of `other` with those of this publisher.
  #[inline]
  fn merge<B>(self, other: B) -> Merge<Self, B>
  where
    B: Publisher<Output = Self::Output, Failure = Self::Failure>,
  {
    Merge { first: self, second: other }
  }

  /// Map every value to a publisher and merge their values, with at most
  /// `max_publishers` of them subscribed at a time.
  #[inline]
  fn flat_map<Q, F>(self, max_publishers: impl Into<Demand>, f: F) -> FlatMap<Self, F>
  where
    F: FnMut(Self::Output) -> Q + Send + 'static,
    Q: Publisher<Failure = Self::Failure>,
  {
    FlatMap { source: self, func: f, max_publishers: max_publishers.into() }
  }

  /// Deliver values and completion on `scheduler`.
  #[inline]
  fn receive_on<Sch: Scheduler>(self, scheduler: Sch) -> ReceiveOn<Self, Sch> {
    ReceiveOn { source: self, scheduler }
  }

  /// Subscribe, request and cancel on `scheduler`.
  #[inline]
  fn subscribe_on<Sch: Scheduler>(self, scheduler: Sch) -> SubscribeOn<Self, Sch> {
    SubscribeOn { source: self, scheduler }
  }

  /// Hide the concrete type of this pipeline.
  #[inline]
  fn erase(self) -> AnyPublisher<Self::Output, Self::Failure>
  where
    Self: Send + 'static,
  {
    AnyPublisher::new(self)
  }

  /// Subscribe with a `futures::Stream` that requests one value per poll.
  #[inline]
  fn into_stream(self) -> IntoStream<Self::Output, Self::Failure> { IntoStream::new(self) }

  /// Subscribe with closures, requesting unlimited demand.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxcombine::prelude::*;
  ///
  /// let sum = Arc::new(Mutex::new(0));
  /// let s = sum.clone();
  /// let handle = from_iter(1..=4).sink(|_| {}, move |v| *s.lock().unwrap() += v);
  /// assert_eq!(*sum.lock().unwrap(), 10);
  /// assert!(handle.is_closed());
  /// ```
  fn sink<FC, FV>(self, on_completion: FC, on_value: FV) -> Cancellable
  where
    FC: FnOnce(Completion<Self::Failure>) + Send + 'static,
    FV: FnMut(Self::Output) + Send + 'static,
  {
    let handle = Cancellable::default();
    self.subscribe(Sink::new(on_value, on_completion, handle.clone()));
    handle
  }

  /// Subscribe with a value closure. Only for publishers that cannot fail.
  fn sink_value<FV>(self, on_value: FV) -> Cancellable
  where
    Self: Publisher<Failure = Never>,
    FV: FnMut(Self::Output) + Send + 'static,
  {
    self.sink(ignore::<Never>, on_value)
  }

  /// Write every value into `target` through `setter`.
  fn assign<T, F>(self, target: Arc<Mutex<T>>, setter: F) -> Cancellable
  where
    Self: Publisher<Failure = Never>,
    T: Send + 'static,
    F: FnMut(&mut T, Self::Output) + Send + 'static,
  {
    let handle = Cancellable::default();
    self.subscribe(Assign::new(target, setter, handle.clone()));
    handle
  }
}

impl<P: Publisher> PublisherExt for P {}
