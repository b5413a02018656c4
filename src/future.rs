//! Consumer half of a completion pair
//!
//! A future either blocks for the outcome (`get`) or arms a continuation
//! (`then`, `and_then`, `on_exception`). Continuations run synchronously on
//! whichever thread satisfies the promise, or inline on the caller when the
//! outcome is already present. Every consuming operation uses up the handle;
//! later calls on the same handle report `NoState`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{FutureError, Result};
use crate::promise::Promise;
use crate::state::{forward, Continuation, Outcome, SharedState};

/// Consumer handle for an outcome produced by a [`Promise`].
pub struct Future<T> {
    state: Option<Arc<SharedState<T>>>,
}

impl<T: Send + 'static> Future<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state: Some(state) }
    }

    /// A future that is already completed with `value`.
    pub fn ready(value: T) -> Self {
        Self {
            state: Some(SharedState::with_value(value)),
        }
    }

    /// Block until the outcome arrives and return it. Consumes the handle.
    ///
    /// This is the only blocking operation in the crate.
    pub fn get(&mut self) -> Result<T> {
        let state = self.take_state()?;
        state.wait_outcome()
    }

    /// Arm `func` to transform the value once it arrives; the returned
    /// future completes with the transformed value.
    ///
    /// On an already-completed future, `func` runs inline on the calling
    /// thread; otherwise it runs on the thread that satisfies the promise.
    /// An error outcome skips `func` and propagates into the new future. A
    /// panic in `func` becomes [`FutureError::Panicked`] downstream.
    pub fn then<R, F>(&mut self, func: F) -> Result<Future<R>>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let state = self.take_state()?;
        let mut next = Promise::new();
        let future = next.get_future()?;

        let continuation = Continuation::Direct(Box::new(move |outcome: Outcome<T>| {
            let next_outcome = match outcome {
                Ok(value) => catch(move || func(value)),
                Err(error) => Err(error),
            };
            forward(next, next_outcome);
        }));
        state.arm_or_run(continuation);
        Ok(future)
    }

    /// Arm `func` to produce another future from the value; the returned
    /// future completes with that inner future's outcome (flattening).
    ///
    /// Same dispatch, error, and panic rules as [`Future::then`]. An inner
    /// future whose handle was already consumed yields `NoState` downstream.
    pub fn and_then<R, F>(&mut self, func: F) -> Result<Future<R>>
    where
        F: FnOnce(T) -> Future<R> + Send + 'static,
        R: Send + 'static,
    {
        let state = self.take_state()?;
        let mut next = Promise::new();
        let future = next.get_future()?;

        let continuation = Continuation::Chained(Box::new(move |outcome: Outcome<T>| {
            match outcome {
                Ok(value) => match catch(move || func(value)) {
                    Ok(inner) => inner.chain_to(next),
                    Err(error) => forward(next, Err(error)),
                },
                Err(error) => forward(next, Err(error)),
            }
        }));
        state.arm_or_run(continuation);
        Ok(future)
    }

    /// Arm `hook` to observe a failure outcome. Runs immediately when the
    /// future already failed; never runs once a value is present. Consumes
    /// the handle.
    pub fn on_exception<F>(&mut self, hook: F) -> Result<()>
    where
        F: FnOnce(FutureError) + Send + 'static,
    {
        let state = self.take_state()?;
        state.arm_error_hook(Box::new(hook));
        Ok(())
    }

    /// Whether an outcome is already stored. `false` on a consumed handle.
    pub fn is_ready(&self) -> bool {
        self.state.as_ref().map_or(false, |state| state.is_complete())
    }

    /// Hand this future's outcome to `target` once it arrives. Consumes
    /// the future.
    pub(crate) fn chain_to(mut self, target: Promise<T>) {
        match self.take_state() {
            Ok(state) => state.arm_chained(target),
            Err(error) => forward(target, Err(error)),
        }
    }

    pub(crate) fn has_state(&self) -> bool {
        self.state.is_some()
    }

    fn take_state(&mut self) -> Result<Arc<SharedState<T>>> {
        self.state.take().ok_or(FutureError::NoState)
    }
}

impl<T: Send + 'static> Future<Future<T>> {
    /// Collapse one level of nesting.
    pub fn flatten(&mut self) -> Result<Future<T>> {
        self.and_then(|inner| inner)
    }
}

/// Run a user callable, converting a panic into the error outcome.
fn catch<R>(func: impl FnOnce() -> R) -> Outcome<R> {
    panic::catch_unwind(AssertUnwindSafe(func)).map_err(FutureError::from_panic)
}


#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_get_blocks_until_satisfied() {
        let mut promise = Promise::new();
        let mut future = promise.get_future().unwrap();

        let completer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            promise.set_value(99).unwrap();
        });

        // Blocks here until the completer thread runs.
        assert_eq!(future.get().unwrap(), 99);
        completer.join().unwrap();
    }

    #[test]
    fn test_deferred_continuation_runs_on_completer_thread() {
        let mut promise = Promise::new();
        let mut future = promise.get_future().unwrap();

        let continuation_thread = Arc::new(Mutex::new(None));
        let recorded = continuation_thread.clone();
        let mut next = future
            .then(move |v: u64| {
                *recorded.lock().unwrap() = Some(thread::current().id());
                v + 1
            })
            .unwrap();

        let completer = thread::spawn(move || {
            let id = thread::current().id();
            promise.set_value(1).unwrap();
            id
        });
        let completer_id = completer.join().unwrap();

        assert_eq!(next.get().unwrap(), 2);
        let ran_on = continuation_thread.lock().unwrap().unwrap();
        assert_eq!(ran_on, completer_id);
        assert_ne!(ran_on, thread::current().id());
    }

    #[test]
    fn test_inline_continuation_runs_on_calling_thread() {
        let mut future = Future::ready(1u64);
        let continuation_thread = Arc::new(Mutex::new(None));
        let recorded = continuation_thread.clone();

        let mut next = future
            .then(move |v| {
                *recorded.lock().unwrap() = Some(thread::current().id());
                v + 1
            })
            .unwrap();

        assert_eq!(next.get().unwrap(), 2);
        assert_eq!(
            continuation_thread.lock().unwrap().unwrap(),
            thread::current().id()
        );
    }

    #[test]
    fn test_broken_promise_crosses_threads() {
        let mut promise = Promise::<i32>::new();
        let mut future = promise.get_future().unwrap();
        let mut tail = future.then(|v| v).unwrap();

        let dropper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            drop(promise);
        });

        assert!(matches!(tail.get(), Err(FutureError::BrokenPromise)));
        dropper.join().unwrap();
    }

    #[test]
    fn test_chain_completed_from_another_thread() {
        let mut promise = Promise::new();
        let mut future = promise.get_future().unwrap();
        let mut tail = future
            .then(|v: i32| v * 2)
            .unwrap()
            .then(|v| v + 1)
            .unwrap();

        let completer = thread::spawn(move || promise.set_value(10).unwrap());
        assert_eq!(tail.get().unwrap(), 21);
        completer.join().unwrap();
    }

    #[test]
    fn test_flattened_inner_completes_on_another_thread() {
        let mut outer_promise = Promise::new();
        let mut outer = outer_promise.get_future().unwrap();
        let mut inner_promise = Promise::new();
        let inner = inner_promise.get_future().unwrap();

        let mut tail = outer.and_then(move |_: u8| inner).unwrap();

        outer_promise.set_value(1).unwrap();
        // Outer done; the tail still waits on the inner outcome.
        assert!(!tail.is_ready());

        let completer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            inner_promise.set_value(99).unwrap();
        });

        assert_eq!(tail.get().unwrap(), 99);
        completer.join().unwrap();
    }
}
