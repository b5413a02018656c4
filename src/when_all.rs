//! Joining many futures into one
//!
//! [`when_all`] turns a vec of same-typed futures into one future for all
//! the values; the [`crate::when_all!`] macro and [`WhenAllTuple`] cover
//! mixed types for small arities. The output completes only after every
//! input reported, keeps input order, and collects failures into an
//! [`AggregateError`].

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{AggregateError, FutureError, Result};
use crate::future::Future;
use crate::promise::Promise;

/// Slot bookkeeping shared by the arms of one join.
struct Countdown {
    remaining: AtomicUsize,
    failures: AtomicUsize,
    errors: Mutex<Vec<Option<FutureError>>>,
}

impl Countdown {
    fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            failures: AtomicUsize::new(0),
            errors: Mutex::new((0..count).map(|_| None).collect()),
        }
    }

    fn record_error(&self, index: usize, error: FutureError) {
        self.errors.lock().unwrap()[index] = Some(error);
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    /// True when this report was the last one outstanding.
    fn arrive(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::SeqCst) == 1
    }

    fn failed(&self) -> bool {
        self.failures.load(Ordering::SeqCst) > 0
    }

    /// Recorded failures in input order.
    fn drain_errors(&self) -> Vec<FutureError> {
        let mut slots = self.errors.lock().unwrap();
        slots.iter_mut().filter_map(Option::take).collect()
    }
}

struct VecContext<T> {
    values: Mutex<Vec<Option<T>>>,
    countdown: Countdown,
    output: Mutex<Option<Promise<Vec<T>>>>,
}

impl<T: Send + 'static> VecContext<T> {
    fn finish(&self) {
        let mut output = self
            .output
            .lock()
            .unwrap()
            .take()
            .expect("join finalized twice");
        let outcome = if self.countdown.failed() {
            output.set_exception(AggregateError::new(self.countdown.drain_errors()))
        } else {
            let values = mem::take(&mut *self.values.lock().unwrap())
                .into_iter()
                .map(|slot| slot.expect("input slot missing its value"))
                .collect();
            output.set_value(values)
        };
        if outcome.is_err() {
            tracing::error!("join output promise was already satisfied");
        }
    }
}

/// Join same-typed futures into one future for all the values, in input
/// order.
///
/// Fails synchronously with `NoState` if any input handle was already
/// consumed. An empty input completes immediately. When inputs fail, the
/// output fails with an [`AggregateError`] once every input has reported;
/// a single early failure never short-circuits the join.
pub fn when_all<T: Send + 'static>(inputs: Vec<Future<T>>) -> Result<Future<Vec<T>>> {
    if inputs.iter().any(|input| !input.has_state()) {
        return Err(FutureError::NoState);
    }

    let count = inputs.len();
    let mut output = Promise::new();
    let future = output.get_future()?;
    if count == 0 {
        output.set_value(Vec::new())?;
        return Ok(future);
    }
    tracing::trace!("joining {} futures", count);

    let context = Arc::new(VecContext {
        values: Mutex::new((0..count).map(|_| None).collect()),
        countdown: Countdown::new(count),
        output: Mutex::new(Some(output)),
    });

    // One decrement per slot: a value runs the then arm, a failure bypasses
    // it and fires the error hook on the tail instead.
    for (index, mut input) in inputs.into_iter().enumerate() {
        let on_value = Arc::clone(&context);
        let mut tail = input.then(move |value| {
            on_value.values.lock().unwrap()[index] = Some(value);
            if on_value.countdown.arrive() {
                on_value.finish();
            }
        })?;
        let on_error = Arc::clone(&context);
        tail.on_exception(move |error| {
            on_error.countdown.record_error(index, error);
            if on_error.countdown.arrive() {
                on_error.finish();
            }
        })?;
    }

    Ok(future)
}

/// Tuple counterpart of [`when_all`] for mixed value types.
///
/// Implemented for tuples of two to five futures; the [`crate::when_all!`]
/// macro is the usual entry point.
pub trait WhenAllTuple {
    type Values;

    /// Join every future in the tuple; same completion and error rules as
    /// [`when_all`].
    fn when_all(self) -> Result<Future<Self::Values>>;
}

struct TupleContext<V, O> {
    values: Mutex<V>,
    countdown: Countdown,
    output: Mutex<Option<Promise<O>>>,
}

macro_rules! tuple_join {
    ($count:expr => $(($idx:tt, $input:ident, $T:ident)),+) => {
        impl<$($T: Send + 'static),+> WhenAllTuple for ($(Future<$T>,)+) {
            type Values = ($($T,)+);

            fn when_all(self) -> Result<Future<Self::Values>> {
                let ($(mut $input,)+) = self;
                if [$($input.has_state()),+].into_iter().any(|ok| !ok) {
                    return Err(FutureError::NoState);
                }

                let mut output = Promise::new();
                let future = output.get_future()?;
                let context = Arc::new(TupleContext {
                    values: Mutex::new(($(Option::<$T>::None,)+)),
                    countdown: Countdown::new($count),
                    output: Mutex::new(Some(output)),
                });

                $(
                    let on_value = Arc::clone(&context);
                    let mut tail = $input.then(move |value| {
                        on_value.values.lock().unwrap().$idx = Some(value);
                        if on_value.countdown.arrive() {
                            on_value.finish();
                        }
                    })?;
                    let on_error = Arc::clone(&context);
                    tail.on_exception(move |error| {
                        on_error.countdown.record_error($idx, error);
                        if on_error.countdown.arrive() {
                            on_error.finish();
                        }
                    })?;
                )+

                Ok(future)
            }
        }

        impl<$($T: Send + 'static),+> TupleContext<($(Option<$T>,)+), ($($T,)+)> {
            fn finish(&self) {
                let mut output = self
                    .output
                    .lock()
                    .unwrap()
                    .take()
                    .expect("join finalized twice");
                let outcome = if self.countdown.failed() {
                    output.set_exception(AggregateError::new(self.countdown.drain_errors()))
                } else {
                    let mut slots = self.values.lock().unwrap();
                    let values = ($(slots.$idx.take().expect("input slot missing its value"),)+);
                    drop(slots);
                    output.set_value(values)
                };
                if outcome.is_err() {
                    tracing::error!("join output promise was already satisfied");
                }
            }
        }
    };
}

tuple_join!(2 => (0, f0, T0), (1, f1, T1));
tuple_join!(3 => (0, f0, T0), (1, f1, T1), (2, f2, T2));
tuple_join!(4 => (0, f0, T0), (1, f1, T1), (2, f2, T2), (3, f3, T3));
tuple_join!(5 => (0, f0, T0), (1, f1, T1), (2, f2, T2), (3, f3, T3), (4, f4, T4));

/// Join a fixed set of differently-typed futures, yielding a future for the
/// tuple of their values.
///
/// ```
/// use rust_minifut::Promise;
///
/// let mut left = Promise::new();
/// let mut right = Promise::new();
/// let first = left.get_future().unwrap();
/// let second = right.get_future().unwrap();
///
/// let mut both = rust_minifut::when_all!(first, second).unwrap();
/// left.set_value(1u8).unwrap();
/// right.set_value("two").unwrap();
/// assert_eq!(both.get().unwrap(), (1u8, "two"));
/// ```
#[macro_export]
macro_rules! when_all {
    ($($future:expr),+ $(,)?) => {
        $crate::WhenAllTuple::when_all(($($future,)+))
    };
}
