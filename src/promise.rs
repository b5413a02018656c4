//! Producer half of a completion pair
//!
//! A promise hands out its future once and is satisfied at most once. A
//! promise dropped unsatisfied reports `BrokenPromise` through the error
//! channel like any other failure.

use std::sync::Arc;

use crate::error::{FutureError, Result};
use crate::future::Future;
use crate::state::{Outcome, SharedState};

/// Producer handle that satisfies a [`Future`] with a value or an error.
pub struct Promise<T> {
    state: Arc<SharedState<T>>,
    future_retrieved: bool,
    completed: bool,
}

impl<T: Send + 'static> Promise<T> {
    /// Create an unsatisfied promise.
    pub fn new() -> Self {
        Self {
            state: SharedState::new(),
            future_retrieved: false,
            completed: false,
        }
    }

    /// Hand out the consumer half. Works once per promise; retrieval is
    /// allowed before or after satisfaction.
    pub fn get_future(&mut self) -> Result<Future<T>> {
        if self.future_retrieved {
            return Err(FutureError::FutureAlreadyRetrieved);
        }
        self.future_retrieved = true;
        Ok(Future::from_state(Arc::clone(&self.state)))
    }

    /// Satisfy the promise with a value.
    pub fn set_value(&mut self, value: T) -> Result<()> {
        self.complete_internal(Ok(value))
    }

    /// Satisfy the promise with an error. Arbitrary error types wrap via
    /// [`FutureError::other`].
    pub fn set_exception(&mut self, error: impl Into<FutureError>) -> Result<()> {
        self.complete_internal(Err(error.into()))
    }

    /// Whether this promise has already been satisfied.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Promise<()> {
    /// Satisfy a unit promise.
    pub fn set_done(&mut self) -> Result<()> {
        self.set_value(())
    }
}

impl<T> Promise<T> {
    // No Send bound: the Drop impl must be able to call this.
    pub(crate) fn complete_internal(&mut self, outcome: Outcome<T>) -> Result<()> {
        if self.completed {
            return Err(FutureError::PromiseAlreadySatisfied);
        }
        self.completed = true;
        self.state.complete(outcome);
        Ok(())
    }
}

impl<T: Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::debug!("promise dropped unsatisfied, reporting broken promise");
            self.state.complete(Err(FutureError::BrokenPromise));
        }
    }
}
