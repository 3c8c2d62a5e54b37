use std::{marker::PhantomData, sync::Arc};

use super::Publisher;
use crate::{
  outlet::{BufferPolicy, Conduit, Idle, Outlet},
  subscriber::{Completion, Subscriber},
};

/// A publisher that eventually produces a single result.
///
/// The producer closure runs once per subscription, after the handshake, and
/// receives a [`Resolver`]. It may resolve synchronously or hand the resolver
/// to another thread. A success is delivered as one value followed by
/// completion, as soon as the subscriber has demand; a failure terminates the
/// stream. A resolver dropped without resolving leaves the stream open.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let answer = Promise::new(|resolver: Resolver<i32, String>| {
///   std::thread::spawn(move || resolver.resolve(Ok(42)));
/// });
///
/// let (probe, handle) = Probe::unlimited();
/// answer.subscribe(probe);
/// while !handle.is_terminated() {
///   std::thread::yield_now();
/// }
/// assert_eq!(handle.values(), vec![42]);
/// ```
pub struct Promise<F, O, E> {
  producer: F,
  _p: PhantomData<fn() -> (O, E)>,
}

/// The one-shot completion handle passed to a [`Promise`] producer.
pub struct Resolver<O, E> {
  outlet: Arc<dyn Conduit<O, E>>,
}

impl<O, E> Resolver<O, E> {
  /// Settle the promise. Ignored if the subscriber already cancelled.
  pub fn resolve(self, result: Result<O, E>) {
    match result {
      Ok(value) => {
        self.outlet.offer(value);
        self.outlet.finish(Completion::Finished);
      }
      Err(error) => self.outlet.finish(Completion::Failure(error)),
    }
  }
}

impl<F, O, E> Promise<F, O, E>
where
  F: FnOnce(Resolver<O, E>),
{
  pub fn new(producer: F) -> Self { Promise { producer, _p: PhantomData } }
}

impl<F: Clone, O, E> Clone for Promise<F, O, E> {
  fn clone(&self) -> Self { Promise { producer: self.producer.clone(), _p: PhantomData } }
}

impl<F, O, E> Publisher for Promise<F, O, E>
where
  F: FnOnce(Resolver<O, E>),
  O: Send + 'static,
  E: Send + 'static,
{
  type Output = O;
  type Failure = E;

  fn subscribe<S: Subscriber<O, E>>(self, subscriber: S) {
    let outlet = Arc::new(Outlet::new(subscriber, BufferPolicy::Unbounded, Idle));
    outlet.start(outlet.clone());
    (self.producer)(Resolver { outlet });
  }
}
