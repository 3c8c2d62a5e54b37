use super::Publisher;
use crate::subscriber::{BoxedSubscriber, Subscriber};

trait DynPublisher<O, E>: Send {
  fn dyn_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<O, E>);
}

impl<P> DynPublisher<P::Output, P::Failure> for P
where
  P: Publisher + Send,
{
  fn dyn_subscribe(self: Box<Self>, subscriber: BoxedSubscriber<P::Output, P::Failure>) {
    (*self).subscribe(subscriber)
  }
}

/// A type-erased publisher exposing only its output and failure types.
///
/// Use it to return pipelines from functions or to store publishers of
/// different concrete types together. Created with
/// [`erase`](crate::ops::PublisherExt::erase).
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// fn evens(flag: bool) -> AnyPublisher<i32, Never> {
///   if flag {
///     from_iter(0..10).filter(|v| v % 2 == 0).erase()
///   } else {
///     just(0).erase()
///   }
/// }
///
/// let (probe, handle) = Probe::unlimited();
/// evens(true).subscribe(probe);
/// assert_eq!(handle.values(), vec![0, 2, 4, 6, 8]);
/// ```
pub struct AnyPublisher<O, E> {
  inner: Box<dyn DynPublisher<O, E>>,
}

impl<O, E> AnyPublisher<O, E> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = O, Failure = E> + Send + 'static,
  {
    AnyPublisher { inner: Box::new(publisher) }
  }
}

impl<O: Send + 'static, E: Send + 'static> Publisher for AnyPublisher<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S: Subscriber<O, E>>(self, subscriber: S) {
    self.inner.dyn_subscribe(Box::new(subscriber))
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn erased_publishers_share_a_type() {
    let sources: Vec<AnyPublisher<i32, Never>> =
      vec![just(1).erase(), from_iter(vec![2, 3]).erase(), empty().erase()];
    let (probe, handle) = Probe::unlimited();
    merge_many(sources).subscribe(probe);
    assert_eq!(handle.values(), vec![1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }
}
