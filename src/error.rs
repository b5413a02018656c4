//! Error types for promise/future completion
//!
//! Structural misuse of a handle surfaces as an `Err` at the call site;
//! everything else travels through the shared state's error slot to `get`,
//! `on_exception`, or the next promise in a chain.

use std::any::Any;

use thiserror::Error;

/// Caller-supplied errors are carried boxed through the error slot.
pub type BoxError = Box<dyn std::error::Error + Send + 'static>;

#[derive(Error, Debug)]
pub enum FutureError {
    /// The promise was dropped before it was satisfied.
    #[error("Broken promise")]
    BrokenPromise,

    /// `get_future` was called a second time on the same promise.
    #[error("Future already retrieved")]
    FutureAlreadyRetrieved,

    /// The promise was already satisfied with a value or an error.
    #[error("Promise already satisfied")]
    PromiseAlreadySatisfied,

    /// The handle was already consumed by `get`, `then`, or a combinator.
    #[error("No shared state behind this handle")]
    NoState,

    /// A continuation callable panicked; the payload is rendered as text.
    #[error("Continuation panicked: {0}")]
    Panicked(String),

    /// One or more inputs of a `when_all` failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// An error supplied by the producer via `set_exception`.
    #[error("{0}")]
    Other(BoxError),
}

impl FutureError {
    /// Wrap an arbitrary error so it can be fed to `set_exception`.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        FutureError::Other(Box::new(error))
    }

    /// Render a caught panic payload into the `Panicked` variant.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        FutureError::Panicked(message)
    }
}

impl From<BoxError> for FutureError {
    fn from(error: BoxError) -> Self {
        FutureError::Other(error)
    }
}

/// Collected failures from a `when_all`, in input order.
#[derive(Error, Debug)]
#[error("{} of the joined futures failed", .errors.len())]
pub struct AggregateError {
    errors: Vec<FutureError>,
}

impl AggregateError {
    pub(crate) fn new(errors: Vec<FutureError>) -> Self {
        Self { errors }
    }

    /// The individual failures, ordered by input slot.
    pub fn errors(&self) -> &[FutureError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FutureError> {
        self.errors
    }
}

pub type Result<T> = std::result::Result<T, FutureError>;
