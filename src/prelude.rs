//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Demand and the protocol traits
pub use crate::demand::Demand;
// Errors
pub use crate::error::{BoxError, Error};
// Operators
pub use crate::ops::{merge_many, EventHooks, PublisherExt, RetryConfig, RetryPolicy};
// Sources
pub use crate::publisher::{
  deferred, empty, fail, from_iter, interval, just, never, timer, AnyPublisher, Just, Never,
  Promise, Publisher, Resolver,
};
// Schedulers
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{Duration, ImmediateScheduler, Scheduler, TaskHandle, TestScheduler};
// Subjects
pub use crate::subject::{CurrentValueSubject, PassthroughSubject};
// Subscribers
pub use crate::subscriber::{Completion, Probe, ProbeHandle, Subscriber};
// Subscriptions
pub use crate::subscription::{AnySubscription, CancelGuard, Cancellable, Subscription};
