// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Results that are either available now or after a future resolves.

use core::fmt;
use core::future::Future;
use core::mem;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;

use crate::error::HingeError;

/// A boxed, single-threaded future yielding a hinge result.
pub type HingeFuture<U> = LocalBoxFuture<'static, Result<U, HingeError>>;

/// The result of running a pipeline: ready now, or pending on a future.
///
/// Synchronous pipelines produce [`Outcome::Ready`]. Pipelines of hinges in
/// asynchronous mode always produce [`Outcome::Pending`], and nothing past
/// their first stage runs until the outcome is awaited.
///
/// `Outcome` is itself a [`Future`], so it can be awaited regardless of which
/// variant it is. A ready outcome completes on its first poll.
///
/// # Example
///
/// ```rust
/// use understory_hinge::Outcome;
///
/// let now = Outcome::ok(3_u8);
/// assert!(!now.is_pending());
/// assert_eq!(now.now().ok(), Some(3));
///
/// let later = Outcome::pending(async { Ok(4_u8) });
/// assert!(later.is_pending());
/// assert_eq!(futures::executor::block_on(later).ok(), Some(4));
/// ```
#[must_use = "pipelines of asynchronous hinges do nothing unless awaited"]
pub enum Outcome<U> {
    /// The pipeline already finished.
    Ready(Result<U, HingeError>),
    /// The pipeline finishes when this future resolves.
    Pending(HingeFuture<U>),
}

impl<U: 'static> Outcome<U> {
    /// A finished, successful outcome.
    pub fn ok(value: U) -> Self {
        Self::Ready(Ok(value))
    }

    /// A finished, failed outcome.
    pub fn err(err: HingeError) -> Self {
        Self::Ready(Err(err))
    }

    /// A pending outcome driven by `future`.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<U, HingeError>> + 'static,
    {
        Self::Pending(future.boxed_local())
    }

    /// Returns `true` if the outcome is backed by a future.
    #[must_use]
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns the result without blocking.
    ///
    /// A pending outcome is polled once. If it does not complete on that poll
    /// it is dropped and [`HingeError::NotReady`] is returned.
    pub fn now(self) -> Result<U, HingeError> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.now_or_never().unwrap_or(Err(HingeError::NotReady)),
        }
    }

    /// Turns a ready outcome into a resolved future; pending ones are unchanged.
    pub fn lift(self) -> Self {
        match self {
            Self::Ready(result) => Self::pending(core::future::ready(result)),
            pending @ Self::Pending(_) => pending,
        }
    }

    /// Lifts the outcome when the producing hinge is in asynchronous mode.
    #[inline]
    pub(crate) fn lift_if(self, is_async: bool) -> Self {
        if is_async { self.lift() } else { self }
    }

    /// Maps the successful value.
    pub fn map<V: 'static>(self, f: impl FnOnce(U) -> V + 'static) -> Outcome<V> {
        match self {
            Self::Ready(result) => Outcome::Ready(result.map(f)),
            Self::Pending(future) => Outcome::Pending(future.map(|result| result.map(f)).boxed_local()),
        }
    }

    /// Runs `next` once this outcome succeeds.
    ///
    /// Ready outcomes call `next` immediately. Pending outcomes call it after
    /// their future resolves. Failures short-circuit.
    pub fn and_then<V: 'static>(self, next: impl FnOnce(U) -> Outcome<V> + 'static) -> Outcome<V> {
        match self {
            Self::Ready(Ok(value)) => next(value),
            Self::Ready(Err(err)) => Outcome::Ready(Err(err)),
            Self::Pending(future) => Outcome::pending(async move {
                let value = future.await?;
                next(value).await
            }),
        }
    }
}

// The boxed future is already pinned and the ready result is moved out, never
// pinned in place.
impl<U> Unpin for Outcome<U> {}

impl<U> Future for Outcome<U> {
    type Output = Result<U, HingeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut() {
            Self::Pending(future) => future.as_mut().poll(cx),
            // Polling again after completion reports `NotReady`.
            Self::Ready(result) => Poll::Ready(mem::replace(result, Err(HingeError::NotReady))),
        }
    }
}

impl<U: fmt::Debug> fmt::Debug for Outcome<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
