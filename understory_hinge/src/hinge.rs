// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hinges: typed slots with a stage pipeline.
//!
//! A [`Hinge<T>`] owns one [`Token`]. Reading it through [`Hinge::get`]
//! returns the value stored under that token on an [`Instance`], filling an
//! empty slot from the hinge's [`Initial`] first. Writing it through
//! [`Hinge::set`] stores the value and runs the pipeline.
//!
//! ## Get and set
//!
//! - **Set** stores the value, then runs the pipeline with it and returns the
//!   pipeline's result. Without a pipeline the result is `None`.
//! - **Get** on an occupied slot returns the stored value and runs nothing.
//!   On an empty slot with a default, it stores the default, runs the pipeline
//!   once for its side effects, discards the pipeline's result, and returns
//!   what is stored afterwards.
//!
//! ## Composition
//!
//! Stages run in registration order, and every stage sees the same
//! `(instance, value, token)`; one stage's result is **not** the next stage's
//! input. The pipeline's result is the last stage's result.
//!
//! Registering an asynchronous stage switches the hinge to asynchronous mode
//! for good. From then on every stage after the first waits for the previous
//! one to resolve, and all results come back as [`Outcome::Pending`].
//!
//! A hinge registered as a stage of another hinge is merged as a subcommand:
//! its pipeline runs against the outer token, its default is never returned,
//! and its tokens are appended to the outer hinge's ancestry.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::panic::Location;

use crate::command::Command;
use crate::error::HingeError;
use crate::initial::Initial;
use crate::instance::Instance;
use crate::outcome::Outcome;
use crate::stage::{Callable, Pipe, Resolved, Stage, pipe};
use crate::token::Token;

/// Tag used by [`Hinge::debug`] when none is given.
pub const DEFAULT_DEBUG_TAG: &str = "-state-";

/// Log target of [`Hinge::debug`] events.
pub const DEBUG_TARGET: &str = "understory_hinge::debug";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Discipline {
    Sync,
    Async,
}

struct State<T> {
    token: Token,
    initial: Initial<T>,
    pipeline: Option<Pipe<T>>,
    ancestry: Vec<Token>,
    is_async: bool,
}

/// A typed slot with a pipeline of stages.
///
/// `Hinge` is a shared handle: clones refer to the same hinge, and
/// registration methods return such a clone so calls can be chained.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_hinge::{Hinge, Instance};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = Rc::clone(&seen);
///
/// let title = Hinge::with_value(String::from("untitled"))
///     .then_sync(move |_, value, _| {
///         log.borrow_mut().push(value.cloned());
///         Ok(value.map(|v| v.to_uppercase()))
///     });
///
/// let window = Instance::new();
///
/// // The first read stores the default and runs the pipeline for its effects.
/// assert_eq!(title.get(&window).now()?, Some(String::from("untitled")));
/// // Later reads only return the stored value.
/// assert_eq!(title.get(&window).now()?, Some(String::from("untitled")));
/// // Writes return the pipeline's result.
/// assert_eq!(title.set(&window, String::from("notes")).now()?, Some(String::from("NOTES")));
///
/// assert_eq!(seen.borrow().len(), 2);
/// # Ok::<(), understory_hinge::HingeError>(())
/// ```
pub struct Hinge<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T: Clone + 'static> Hinge<T> {
    /// Creates a hinge with no default.
    #[must_use]
    pub fn new() -> Self {
        Self::from_initial(Initial::Absent)
    }

    /// Creates a hinge whose empty slots read as `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::from_initial(Initial::Value(value))
    }

    /// Creates a hinge whose empty slots are filled by `factory`.
    ///
    /// The factory runs at most once per instance until the slot is emptied
    /// again. When the hinge is used as a top-level command, the factory
    /// computes the command's result instead; use [`Hinge::from_initial`]
    /// with [`Initial::factory`] to see the command argument as well.
    #[must_use]
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&Instance) -> T + 'static,
    {
        Self::from_initial(Initial::factory(move |instance, _| factory(instance)))
    }

    /// Creates a hinge with the given default.
    #[must_use]
    pub fn from_initial(initial: Initial<T>) -> Self {
        let token = Token::mint();
        Self {
            state: Rc::new(RefCell::new(State {
                token,
                initial,
                pipeline: None,
                ancestry: alloc::vec![token],
                is_async: false,
            })),
        }
    }

    /// Returns the token this hinge stores its value under.
    #[must_use]
    pub fn token(&self) -> Token {
        self.state.borrow().token
    }

    /// Returns every token this hinge touches: its own first, then those of
    /// merged hinges and groups in merge order.
    #[must_use]
    pub fn ancestry(&self) -> Vec<Token> {
        self.state.borrow().ancestry.clone()
    }

    /// Returns `true` once an asynchronous stage has been registered.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.state.borrow().is_async
    }

    /// Returns `true` if at least one stage has been registered.
    #[must_use]
    pub fn has_pipeline(&self) -> bool {
        self.state.borrow().pipeline.is_some()
    }

    /// Returns the current default.
    #[must_use]
    pub fn initial(&self) -> Initial<T> {
        self.state.borrow().initial.clone()
    }

    /// Returns `true` if both handles refer to the same hinge.
    #[must_use]
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.state, &b.state)
    }

    /// Snapshot of what an invocation needs, taken without holding the borrow
    /// across user code.
    pub(crate) fn parts(&self) -> (Option<Pipe<T>>, bool, Initial<T>) {
        let state = self.state.borrow();
        (state.pipeline.clone(), state.is_async, state.initial.clone())
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Reads the slot on `instance`, applying the default on first read.
    pub fn get(&self, instance: &Instance) -> Outcome<Option<T>> {
        self.access(instance, None)
    }

    /// Writes `value` to the slot on `instance` and runs the pipeline.
    pub fn set(&self, instance: &Instance, value: T) -> Outcome<Option<T>> {
        self.access(instance, Some(value))
    }

    /// Gets (`value` is `None`) or sets (`value` is `Some`) the slot.
    pub fn access(&self, instance: &Instance, value: Option<T>) -> Outcome<Option<T>> {
        let token = self.token();
        self.access_at(instance, value, token)
    }

    /// Like [`Hinge::access`], but against the slot under `token` instead of
    /// this hinge's own.
    ///
    /// The pipeline also receives `token`, so merged stages act on the same
    /// slot.
    pub fn access_at(
        &self,
        instance: &Instance,
        value: Option<T>,
        token: Token,
    ) -> Outcome<Option<T>> {
        let (pipeline, is_async, initial) = self.parts();

        let Some(value) = value else {
            return read(instance, token, pipeline, is_async, &initial);
        };

        instance.insert(token, value.clone());
        match pipeline {
            Some(pipeline) => pipeline(instance, Some(&value), token).lift_if(is_async),
            None => Outcome::ok(None),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Appends a synchronous stage.
    ///
    /// In asynchronous mode the stage still runs synchronously, but only after
    /// the stages before it have resolved.
    pub fn then_sync<F>(&self, stage: F) -> Self
    where
        F: Fn(&Instance, Option<&T>, Token) -> Result<Option<T>, HingeError> + 'static,
    {
        self.install(Resolved::plain(Callable::Sync(Rc::new(stage))), Discipline::Sync)
    }

    /// Appends an asynchronous stage and switches the hinge to asynchronous
    /// mode.
    ///
    /// The stage must return [`Outcome::Pending`]. A ready success makes the
    /// invocation fail with [`HingeError::NotAwaitable`]; a ready failure is
    /// passed through.
    pub fn then_async<F>(&self, stage: F) -> Self
    where
        F: Fn(&Instance, Option<&T>, Token) -> Outcome<Option<T>> + 'static,
    {
        self.install(Resolved::plain(Callable::Async(Rc::new(stage))), Discipline::Async)
    }

    /// Appends any [`Stage`] with synchronous sequencing.
    ///
    /// Hinges are merged as subcommands and groups are unwrapped; see
    /// [`Stage`]. A stage that produces futures (an asynchronous closure, or
    /// a hinge already in asynchronous mode) switches this hinge to
    /// asynchronous mode, since its futures have to be awaited to run at all.
    ///
    /// # Errors
    ///
    /// [`HingeError::MissingCallable`] if the stage has nothing to run. The
    /// hinge is left unchanged.
    pub fn then_sync_stage(&self, stage: impl Into<Stage<T>>) -> Result<Self, HingeError> {
        let resolved = stage.into().resolve()?;
        Ok(self.install(resolved, Discipline::Sync))
    }

    /// Appends any [`Stage`] with asynchronous sequencing.
    ///
    /// Every stage registered this way must produce [`Outcome::Pending`] when
    /// invoked, including merged hinges, which therefore need to be in
    /// asynchronous mode themselves.
    ///
    /// # Errors
    ///
    /// [`HingeError::MissingCallable`] if the stage has nothing to run. The
    /// hinge is left unchanged.
    pub fn then_async_stage(&self, stage: impl Into<Stage<T>>) -> Result<Self, HingeError> {
        let resolved = stage.into().resolve()?;
        Ok(self.install(resolved, Discipline::Async))
    }

    /// Appends a stage that logs the value stored under this hinge's token.
    ///
    /// Events go to the [`DEBUG_TARGET`] target at `INFO` level, tagged with
    /// `tag` or [`DEFAULT_DEBUG_TAG`]. With `show_stack`, a second event
    /// carries the invocation argument and the call site of this method. The
    /// stage's result is `None`.
    #[track_caller]
    pub fn debug(&self, tag: Option<&str>, show_stack: bool) -> Self
    where
        T: fmt::Debug,
    {
        let location = Location::caller();
        let tag = String::from(tag.unwrap_or(DEFAULT_DEBUG_TAG));
        let own = self.token();
        self.then_sync(move |instance, value, _| {
            instance.with::<T, _>(own, |stored| {
                tracing::info!(target: DEBUG_TARGET, tag = %tag, value = ?stored, "hinge state");
            });
            if show_stack {
                tracing::info!(
                    target: DEBUG_TARGET,
                    tag = %tag,
                    args = ?value,
                    location = %location,
                    "hinge invocation"
                );
            }
            Ok(None)
        })
    }

    /// Adapts this hinge into a [`Command`].
    ///
    /// Subcommands never resolve the default; top-level commands return it
    /// once the pipeline finishes.
    #[must_use]
    pub fn as_cmd(&self, subcommand: bool) -> Command<T> {
        Command::new(self.clone(), subcommand)
    }

    fn install(&self, resolved: Resolved<T>, discipline: Discipline) -> Self {
        let Resolved {
            tokens,
            initial,
            callable,
        } = resolved;

        let yields_futures = callable.yields_futures();
        let stage = callable.into_pipe();
        let (stage, switches) = match discipline {
            Discipline::Sync => (stage, yields_futures),
            Discipline::Async => (awaited(stage), true),
        };

        let mut state = self.state.borrow_mut();
        state.ancestry.extend(tokens);
        if state.initial.is_absent() && !initial.is_absent() {
            state.initial = initial;
        }
        state.is_async |= switches;
        let pipeline = match state.pipeline.take() {
            None => stage,
            Some(prev) => sequence(prev, stage, state.is_async),
        };
        state.pipeline = Some(pipeline);

        tracing::trace!(
            token = %state.token,
            ancestry = state.ancestry.len(),
            is_async = state.is_async,
            ?discipline,
            "hinge.register"
        );
        drop(state);

        self.clone()
    }
}

/// Get mode.
fn read<T: Clone + 'static>(
    instance: &Instance,
    token: Token,
    pipeline: Option<Pipe<T>>,
    is_async: bool,
    initial: &Initial<T>,
) -> Outcome<Option<T>> {
    match instance.try_get::<T>(token) {
        Ok(None) => {}
        Ok(stored @ Some(_)) => return Outcome::ok(stored),
        Err(err) => return Outcome::err(err),
    }

    let Some(value) = initial.resolve(instance, None) else {
        return Outcome::ok(None);
    };
    instance.insert(token, value.clone());

    let Some(pipeline) = pipeline else {
        return Outcome::ok(Some(value));
    };
    let instance = instance.clone();
    pipeline(&instance, Some(&value), token)
        .lift_if(is_async)
        .and_then(move |_| Outcome::Ready(instance.try_get::<T>(token)))
}

/// Rejects ready successes from stages registered as asynchronous.
fn awaited<T: 'static>(stage: Pipe<T>) -> Pipe<T> {
    pipe(move |instance, value, token| match stage(instance, value, token) {
        Outcome::Ready(Ok(_)) => Outcome::err(HingeError::NotAwaitable),
        outcome => outcome,
    })
}

/// Runs `next` after `prev` with the same arguments.
///
/// With `deferred`, `prev`'s outcome is lifted first so `next` never starts
/// before it has been awaited.
fn sequence<T: Clone + 'static>(prev: Pipe<T>, next: Pipe<T>, deferred: bool) -> Pipe<T> {
    pipe(move |instance, value, token| {
        match prev(instance, value, token).lift_if(deferred) {
            Outcome::Ready(Ok(_)) => next(instance, value, token),
            Outcome::Ready(Err(err)) => Outcome::err(err),
            Outcome::Pending(head) => {
                let next = Rc::clone(&next);
                let instance = instance.clone();
                let value = value.cloned();
                Outcome::pending(async move {
                    head.await?;
                    next(&instance, value.as_ref(), token).await
                })
            }
        }
    })
}

impl<T: Clone + 'static> Default for Hinge<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Clone impl since the handle is shared regardless of `T`
impl<T> Clone for Hinge<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Hinge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Hinge")
            .field("token", &state.token)
            .field("initial", &state.initial.kind())
            .field("ancestry", &state.ancestry)
            .field("has_pipeline", &state.pipeline.is_some())
            .field("is_async", &state.is_async)
            .finish()
    }
}
