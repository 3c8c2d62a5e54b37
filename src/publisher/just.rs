use std::{marker::PhantomData, sync::Arc};

use super::{Never, Publisher};
use crate::{
  outlet::{BufferPolicy, Idle, Outlet, Pull},
  subscriber::{Completion, Subscriber},
};

/// Emits one value and finishes.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let (probe, handle) = Probe::unlimited();
/// just(42).subscribe(probe);
/// assert_eq!(handle.values(), vec![42]);
/// assert_eq!(handle.completion(), Some(Completion::Finished));
/// ```
pub fn just<O>(value: O) -> Just<O> { Just(value) }

/// Finishes without emitting.
pub fn empty<O, E>() -> Empty<O, E> { Empty(PhantomData) }

/// Fails with `error` without emitting.
pub fn fail<O, E>(error: E) -> Fail<O, E> { Fail(error, PhantomData) }

/// Never emits and never terminates.
pub fn never<O, E>() -> Pending<O, E> { Pending(PhantomData) }

#[derive(Clone, Debug)]
pub struct Just<O>(O);

pub struct Empty<O, E>(PhantomData<fn() -> (O, E)>);

pub struct Fail<O, E>(E, PhantomData<fn() -> O>);

pub struct Pending<O, E>(PhantomData<fn() -> (O, E)>);

impl<O, E> Clone for Empty<O, E> {
  fn clone(&self) -> Self { Empty(PhantomData) }
}

impl<O, E: Clone> Clone for Fail<O, E> {
  fn clone(&self) -> Self { Fail(self.0.clone(), PhantomData) }
}

impl<O, E> Clone for Pending<O, E> {
  fn clone(&self) -> Self { Pending(PhantomData) }
}

struct Once<O>(Option<O>);

impl<O: Send + 'static, E> Pull<O, E> for Once<O> {
  fn pull(&mut self) -> Option<O> { self.0.take() }

  fn exhausted(&mut self) -> Option<Completion<E>> {
    self.0.is_none().then_some(Completion::Finished)
  }
}

struct Terminal<E>(Option<Completion<E>>);

impl<O, E: Send + 'static> Pull<O, E> for Terminal<E> {
  fn pull(&mut self) -> Option<O> { None }

  fn exhausted(&mut self) -> Option<Completion<E>> { self.0.take() }
}

fn launch<S, O, E, P>(subscriber: S, source: P)
where
  S: Subscriber<O, E>,
  O: Send + 'static,
  E: Send + 'static,
  P: Pull<O, E>,
{
  let outlet = Arc::new(Outlet::new(subscriber, BufferPolicy::Unbounded, source));
  outlet.start(outlet.clone());
}

impl<O: Send + 'static> Publisher for Just<O> {
  type Output = O;
  type Failure = Never;

  fn subscribe<S: Subscriber<O, Never>>(self, subscriber: S) {
    launch::<_, O, Never, _>(subscriber, Once(Some(self.0)));
  }
}

impl<O: Send + 'static, E: Send + 'static> Publisher for Empty<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S: Subscriber<O, E>>(self, subscriber: S) {
    launch::<_, O, E, _>(subscriber, Terminal(Some(Completion::Finished)));
  }
}

impl<O: Send + 'static, E: Send + 'static> Publisher for Fail<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S: Subscriber<O, E>>(self, subscriber: S) {
    launch::<_, O, E, _>(subscriber, Terminal(Some(Completion::Failure(self.0))));
  }
}

impl<O: Send + 'static, E: Send + 'static> Publisher for Pending<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S: Subscriber<O, E>>(self, subscriber: S) { launch::<_, O, E, _>(subscriber, Idle) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn just_waits_for_demand() {
    let (probe, handle) = Probe::new(Demand::NONE);
    just("a").subscribe(probe);
    assert!(handle.values().is_empty());
    assert!(!handle.is_terminated());
    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec!["a"]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn empty_finishes_without_demand() {
    let (probe, handle) = Probe::<i32, &str>::new(Demand::NONE);
    empty().subscribe(probe);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn fail_delivers_failure() {
    let (probe, handle) = Probe::<i32, &str>::new(Demand::NONE);
    fail("boom").subscribe(probe);
    assert!(handle.values().is_empty());
    assert_eq!(handle.completion(), Some(Completion::Failure("boom")));
  }

  #[rxcombine_macro::test]
  fn never_stays_open() {
    let (probe, handle) = Probe::<i32, Never>::unlimited();
    never().subscribe(probe);
    assert!(handle.is_subscribed());
    assert!(!handle.is_terminated());
    handle.cancel();
    assert!(!handle.is_terminated());
  }
}
