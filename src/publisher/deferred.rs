use super::Publisher;
use crate::subscriber::Subscriber;

/// Builds a fresh publisher for every subscriber, at subscribe time.
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use rxcombine::prelude::*;
///
/// let built = Arc::new(AtomicUsize::new(0));
/// let b = built.clone();
/// let source = deferred(move || just(b.fetch_add(1, Ordering::SeqCst)));
/// assert_eq!(built.load(Ordering::SeqCst), 0);
///
/// let (probe, handle) = Probe::unlimited();
/// source.subscribe(probe);
/// assert_eq!(handle.values(), vec![0]);
/// ```
pub fn deferred<F, P>(factory: F) -> Deferred<F>
where
  F: FnOnce() -> P,
  P: Publisher,
{
  Deferred(factory)
}

#[derive(Clone)]
pub struct Deferred<F>(F);

impl<F, P> Publisher for Deferred<F>
where
  F: FnOnce() -> P,
  P: Publisher,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<P::Output, P::Failure>,
  {
    (self.0)().subscribe(subscriber)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn factory_runs_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let source = deferred(move || {
      let n = c.fetch_add(1, Ordering::SeqCst);
      from_iter(0..=n)
    });

    let (first, a) = Probe::unlimited();
    source.clone().subscribe(first);
    let (second, b) = Probe::unlimited();
    source.subscribe(second);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.values(), vec![0]);
    assert_eq!(b.values(), vec![0, 1]);
  }
}
