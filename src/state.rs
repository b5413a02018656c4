//! Shared completion state behind a Promise/Future pair
//!
//! One mutex-guarded cell holds the outcome slots and whatever observer is
//! armed on them. Completion decides the observer under the lock and
//! dispatches after releasing it, so user code never runs while the slots
//! are held.

use std::sync::{Arc, Condvar, Mutex};

use crate::error::FutureError;
use crate::promise::Promise;

/// Outcome carried through a state: the value or the error standing in
/// for it.
pub(crate) type Outcome<T> = std::result::Result<T, FutureError>;

pub(crate) type RunFn<T> = Box<dyn FnOnce(Outcome<T>) + Send>;
pub(crate) type ErrorHook = Box<dyn FnOnce(FutureError) + Send>;

/// Closure armed by `then` or `and_then`, consumed with the outcome.
pub(crate) enum Continuation<T> {
    /// The callable produces the next value directly.
    Direct(RunFn<T>),
    /// The callable produces another future that adopts the next promise.
    Chained(RunFn<T>),
}

impl<T> Continuation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Continuation::Direct(_) => "direct",
            Continuation::Chained(_) => "chained",
        }
    }

    fn run(self, outcome: Outcome<T>) {
        match self {
            Continuation::Direct(run) | Continuation::Chained(run) => run(outcome),
        }
    }
}

struct Slots<T> {
    value: Option<T>,
    error: Option<FutureError>,
    continuation: Option<Continuation<T>>,
    chained: Option<Promise<T>>,
    on_error: Option<ErrorHook>,
}

impl<T> Slots<T> {
    // Error takes precedence; at most one of the two is ever set.
    fn take_outcome(&mut self) -> Option<Outcome<T>> {
        if let Some(error) = self.error.take() {
            return Some(Err(error));
        }
        self.value.take().map(Ok)
    }

    fn is_complete(&self) -> bool {
        self.value.is_some() || self.error.is_some()
    }
}

/// Completion cell shared by one promise, at most one future, and any
/// closures that captured it.
pub(crate) struct SharedState<T> {
    slots: Mutex<Slots<T>>,
    ready: Condvar,
}

impl<T> SharedState<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(Slots {
                value: None,
                error: None,
                continuation: None,
                chained: None,
                on_error: None,
            }),
            ready: Condvar::new(),
        })
    }

    /// A state born completed, for `Future::ready`.
    pub(crate) fn with_value(value: T) -> Arc<Self> {
        let state = Self::new();
        state.complete(Ok(value));
        state
    }

    /// The single completion transition. Exactly one observer sees the
    /// outcome: an armed continuation, a chained promise, a blocked `get`,
    /// or (on failure) an armed error hook.
    pub(crate) fn complete(&self, outcome: Outcome<T>) {
        let mut slots = self.slots.lock().unwrap();

        if let Some(continuation) = slots.continuation.take() {
            drop(slots);
            tracing::trace!("dispatching {} continuation", continuation.kind());
            continuation.run(outcome);
            return;
        }

        if let Some(target) = slots.chained.take() {
            drop(slots);
            tracing::trace!("forwarding outcome to chained promise");
            forward(target, outcome);
            return;
        }

        match outcome {
            Ok(value) => slots.value = Some(value),
            Err(error) => {
                // The hook is consulted only on the failure path; a stored
                // value leaves an armed hook in place, never invoked.
                if let Some(hook) = slots.on_error.take() {
                    drop(slots);
                    hook(error);
                    return;
                }
                slots.error = Some(error);
            }
        }

        drop(slots);
        self.ready.notify_all();
    }

    /// Run the continuation now if an outcome is already stored, otherwise
    /// arm it. Check and arm happen under one lock acquisition.
    pub(crate) fn arm_or_run(&self, continuation: Continuation<T>) {
        let mut slots = self.slots.lock().unwrap();
        match slots.take_outcome() {
            None => slots.continuation = Some(continuation),
            Some(outcome) => {
                drop(slots);
                tracing::trace!("running {} continuation inline", continuation.kind());
                continuation.run(outcome);
            }
        }
    }

    /// Adopt `target` as the chained promise, or forward immediately when
    /// the outcome is already stored.
    pub(crate) fn arm_chained(&self, target: Promise<T>) {
        let mut slots = self.slots.lock().unwrap();
        match slots.take_outcome() {
            None => slots.chained = Some(target),
            Some(outcome) => {
                drop(slots);
                forward(target, outcome);
            }
        }
    }

    /// Arm the error observer. A stored error fires it immediately; a
    /// stored value means it will never fire.
    pub(crate) fn arm_error_hook(&self, hook: ErrorHook) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(error) = slots.error.take() {
            drop(slots);
            hook(error);
            return;
        }
        if slots.value.is_none() {
            slots.on_error = Some(hook);
        }
    }

    /// Block until an outcome is stored, then take it.
    pub(crate) fn wait_outcome(&self) -> Outcome<T> {
        let mut slots = self.slots.lock().unwrap();
        loop {
            if let Some(outcome) = slots.take_outcome() {
                return outcome;
            }
            slots = self.ready.wait(slots).unwrap();
        }
    }

    /// Non-blocking peek used by `is_ready`.
    pub(crate) fn is_complete(&self) -> bool {
        self.slots.lock().unwrap().is_complete()
    }
}

/// Push an outcome into a promise owned by the machinery.
pub(crate) fn forward<T>(mut target: Promise<T>, outcome: Outcome<T>) {
    // Each such promise is completed exactly once, so this only fires if a
    // state was driven twice.
    if target.complete_internal(outcome).is_err() {
        tracing::error!("downstream promise was already satisfied");
    }
}
