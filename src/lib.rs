//! rust-minifut: a promise/future completion primitive without an executor
//!
//! This crate provides a single-assignment [`Promise`]/[`Future`] pair with:
//! - Blocking retrieval ([`Future::get`]) for thread rendezvous
//! - Continuation chaining ([`Future::then`], [`Future::and_then`]) with
//!   error short-circuiting
//! - Failure observation ([`Future::on_exception`]) and broken-promise
//!   detection
//! - Multi-future joins ([`when_all`], [`when_all!`]) with aggregated
//!   failures
//!
//! # Dispatch model
//!
//! There is no scheduler. A continuation armed on a pending future runs
//! synchronously on whichever thread satisfies the promise; a continuation
//! attached to an already-completed future runs inline on the calling
//! thread. Deep chains therefore recurse on the completer's stack, so keep
//! chain depth bounded where that matters.
//!
//! # Examples
//!
//! ```rust
//! use rust_minifut::Promise;
//! use std::thread;
//!
//! let mut promise = Promise::new();
//! let mut future = promise.get_future().unwrap();
//!
//! let producer = thread::spawn(move || {
//!     promise.set_value(21).unwrap();
//! });
//!
//! // Runs inline if the producer already finished, otherwise on the
//! // producer thread; the observable result is the same.
//! let mut doubled = future.then(|v| v * 2).unwrap();
//! assert_eq!(doubled.get().unwrap(), 42);
//! producer.join().unwrap();
//! ```
//!
//! Joining a batch of futures preserves input order no matter the
//! completion order:
//!
//! ```rust
//! use rust_minifut::{when_all, Promise};
//!
//! let mut promises: Vec<Promise<u32>> = (0..4).map(|_| Promise::new()).collect();
//! let futures = promises.iter_mut().map(|p| p.get_future().unwrap()).collect();
//!
//! let mut all = when_all(futures).unwrap();
//! for (i, promise) in promises.iter_mut().enumerate() {
//!     promise.set_value(i as u32 * 10).unwrap();
//! }
//! assert_eq!(all.get().unwrap(), vec![0, 10, 20, 30]);
//! ```
//!
//! Failures travel the chain without running skipped callables:
//!
//! ```rust
//! use rust_minifut::{FutureError, Promise};
//!
//! let mut promise = Promise::<i32>::new();
//! let mut future = promise.get_future().unwrap();
//! let mut tail = future.then(|v| v + 1).unwrap();
//!
//! drop(promise); // never satisfied
//! assert!(matches!(tail.get(), Err(FutureError::BrokenPromise)));
//! ```

#![deny(warnings)]

pub mod error;
pub mod future;
pub mod promise;
pub mod when_all;

mod state;

// Re-export core types
pub use error::{AggregateError, BoxError, FutureError, Result};
pub use future::Future;
pub use promise::Promise;
pub use when_all::{when_all, WhenAllTuple};

/// Convenience function to create a connected promise/future pair
pub fn pair<T: Send + 'static>() -> (Promise<T>, Future<T>) {
    let mut promise = Promise::new();
    let future = promise
        .get_future()
        .expect("fresh promise always yields its future");
    (promise, future)
}
