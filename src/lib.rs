//! # rxcombine: demand-driven reactive streams
//!
//! Publishers, subscribers and subscriptions with backpressure, in the style
//! of Apple's Combine. A subscriber pulls values by requesting [`Demand`];
//! a publisher never delivers more than was requested.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcombine::prelude::*;
//!
//! let (probe, handle) = Probe::new(Demand::max(3));
//! from_iter(0..)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 10)
//!   .subscribe(probe);
//! assert_eq!(handle.values(), vec![0, 20, 40]);
//!
//! handle.request(Demand::max(1));
//! assert_eq!(handle.values(), vec![0, 20, 40, 60]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Describes a stream; runs once per `subscribe` |
//! | [`Subscriber`] | Receives a subscription, values and one completion |
//! | [`Subscription`] | Requests demand and cancels |
//! | [`PublisherExt`] | Operators and sinks |
//! | [`PassthroughSubject`] / [`CurrentValueSubject`] | Imperative broadcast |
//! | [`Scheduler`] | Where and when work runs |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): [`ThreadPoolScheduler`] on the
//!   `futures` thread pool
//! - **`timer`** (default): non-blocking delays on the thread pool
//! - **`tokio-scheduler`**: [`TokioScheduler`] on a tokio runtime
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//! Lifecycle events are logged at `debug`, per-value diagnostics at `trace`,
//! and the [`log`](PublisherExt::log) operator reports under the
//! `rxcombine::log` target.
//!
//! [`Demand`]: demand::Demand
//! [`Publisher`]: publisher::Publisher
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`PublisherExt`]: ops::PublisherExt
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject
//! [`Scheduler`]: scheduler::Scheduler
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler
//! [`TokioScheduler`]: scheduler::TokioScheduler
//! [`log`]: ops::PublisherExt::log

pub mod demand;
pub mod error;
pub mod ops;
mod outlet;
pub mod prelude;
pub mod publisher;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use error::{BoxError, Error};
pub use prelude::*;
