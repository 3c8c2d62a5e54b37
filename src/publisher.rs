//! The producer side of a stream, and the built-in sources.
//!
//! A [`Publisher`] is a description of a stream: nothing happens until
//! [`subscribe`](Publisher::subscribe) is called, and every subscription runs
//! the description again from the start.
//!
//! | Factory | Emits |
//! |---------|-------|
//! | [`just`] | one value, then finishes |
//! | [`empty`] | finishes immediately |
//! | [`fail`] | fails immediately |
//! | [`never`] | nothing, never terminates |
//! | [`from_iter`] | the items of an iterator, lazily on demand |
//! | [`deferred`] | whatever the publisher built at subscribe time emits |
//! | [`Promise::new`] | the single result its producer resolves |
//! | [`interval`] | a tick counter every period |
//! | [`timer`] | `()` once after a delay |

use crate::subscriber::Subscriber;

mod any;
mod deferred;
mod interval;
mod just;
mod promise;
mod sequence;

pub use any::AnyPublisher;
pub use deferred::{deferred, Deferred};
pub use interval::{interval, timer, Interval, Timer};
pub use just::{empty, fail, just, never, Empty, Fail, Just, Pending};
pub use promise::{Promise, Resolver};
pub use sequence::{from_iter, Sequence};

/// The failure type of publishers that cannot fail.
pub type Never = std::convert::Infallible;

/// Publisher trait: the producer side of a stream.
///
/// `subscribe` must call
/// [`receive_subscription`](Subscriber::receive_subscription) on the
/// subscriber exactly once before anything else, and must never deliver more
/// values than the subscriber has requested.
pub trait Publisher {
  type Output: Send + 'static;
  type Failure: Send + 'static;

  /// Attach `subscriber` and start the stream.
  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure>;
}
