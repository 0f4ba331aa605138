// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline stages and how they are resolved at registration time.
//!
//! A [`Stage`] is anything that can be appended to a hinge's pipeline:
//!
//! - a plain synchronous or asynchronous closure,
//! - another [`Hinge`], which is merged as a **subcommand**,
//! - a [`Command`], used as-is,
//! - a [`Grouped`] aggregate, which is unwrapped to its raw pipeline.
//!
//! Resolution turns a stage into the tokens it contributes to the caller's
//! ancestry, the default the caller may adopt, and a callable. Resolution is
//! the only place where a stage can be rejected
//! ([`HingeError::MissingCallable`]); a rejected stage leaves the caller
//! untouched.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::command::Command;
use crate::error::HingeError;
use crate::hinge::Hinge;
use crate::initial::Initial;
use crate::instance::Instance;
use crate::outcome::Outcome;
use crate::token::Token;

/// A synchronous stage: `(instance, value, token) -> result`.
pub type SyncStage<T> = Rc<dyn Fn(&Instance, Option<&T>, Token) -> Result<Option<T>, HingeError>>;

/// An asynchronous stage: `(instance, value, token) -> outcome`.
///
/// When registered with [`Hinge::then_async`] the outcome must be
/// [`Outcome::Pending`]; a ready success is reported as
/// [`HingeError::NotAwaitable`].
pub type AsyncStage<T> = Rc<dyn Fn(&Instance, Option<&T>, Token) -> Outcome<Option<T>>>;

/// A composed pipeline. Same shape as an [`AsyncStage`].
pub(crate) type Pipe<T> = AsyncStage<T>;

/// Boxes a closure as a [`Pipe`], pinning down its higher-ranked signature.
pub(crate) fn pipe<T, F>(f: F) -> Pipe<T>
where
    F: Fn(&Instance, Option<&T>, Token) -> Outcome<Option<T>> + 'static,
{
    Rc::new(f)
}

/// An aggregate of hinges, such as a named group of exports.
///
/// Groups are built elsewhere. Merging one into a hinge only needs the tokens
/// it touches, its default, and the pipeline to run in its place.
pub trait Grouped<T> {
    /// Tokens of every slot the group touches.
    fn ancestry(&self) -> Vec<Token>;

    /// Default the merging hinge adopts if it has none of its own.
    fn initial(&self) -> Initial<T> {
        Initial::Absent
    }

    /// The pipeline to run when the group is used as a stage.
    ///
    /// Returning `None` makes the registration fail with
    /// [`HingeError::MissingCallable`].
    fn raw_pipeline(&self) -> Option<RawPipeline<T>>;
}

/// What a [`Grouped`] aggregate exposes as its pipeline.
///
/// Hinges and commands are converted to subcommands before use.
pub enum RawPipeline<T> {
    /// A plain synchronous function.
    Sync(SyncStage<T>),
    /// A plain asynchronous function.
    Async(AsyncStage<T>),
    /// A hinge.
    Hinge(Hinge<T>),
    /// A command.
    Command(Command<T>),
}

/// Something that can be appended to a pipeline.
///
/// # Example
///
/// ```rust
/// use understory_hinge::{Hinge, Instance, Stage};
///
/// let record = Instance::new();
/// let inner = Hinge::<i32>::new().then_sync(|_, value, _| Ok(value.map(|v| v * 2)));
///
/// let outer = Hinge::<i32>::new()
///     .then_sync_stage(&inner)?
///     .then_sync_stage(Stage::from_sync(|_, value, _| Ok(value.map(|v| v + 1))))?;
///
/// assert_eq!(outer.ancestry(), vec![outer.token(), inner.token()]);
/// assert_eq!(outer.set(&record, 10).now()?, Some(11));
/// # Ok::<(), understory_hinge::HingeError>(())
/// ```
pub enum Stage<T> {
    /// A plain synchronous function.
    Sync(SyncStage<T>),
    /// A plain asynchronous function.
    Async(AsyncStage<T>),
    /// A hinge, merged as a subcommand.
    Hinge(Hinge<T>),
    /// A command, used as-is.
    Command(Command<T>),
    /// A grouped aggregate, unwrapped to its raw pipeline.
    Group(Rc<dyn Grouped<T>>),
}

impl<T> Stage<T> {
    /// Wraps a synchronous closure.
    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(&Instance, Option<&T>, Token) -> Result<Option<T>, HingeError> + 'static,
    {
        Self::Sync(Rc::new(f))
    }

    /// Wraps an asynchronous closure.
    pub fn from_async<F>(f: F) -> Self
    where
        F: Fn(&Instance, Option<&T>, Token) -> Outcome<Option<T>> + 'static,
    {
        Self::Async(Rc::new(f))
    }

    /// Wraps a grouped aggregate.
    pub fn group<G: Grouped<T> + 'static>(group: G) -> Self {
        Self::Group(Rc::new(group))
    }
}

impl<T: Clone + 'static> Stage<T> {
    pub(crate) fn resolve(self) -> Result<Resolved<T>, HingeError> {
        match self {
            Self::Sync(f) => Ok(Resolved::plain(Callable::Sync(f))),
            Self::Async(f) => Ok(Resolved::plain(Callable::Async(f))),
            Self::Command(command) => Ok(Resolved::plain(Callable::Command(command))),
            Self::Hinge(hinge) => Ok(Resolved {
                tokens: hinge.ancestry(),
                initial: hinge.initial(),
                callable: Callable::Command(hinge.as_cmd(true)),
            }),
            Self::Group(group) => {
                let callable = match group.raw_pipeline().ok_or(HingeError::MissingCallable)? {
                    RawPipeline::Sync(f) => Callable::Sync(f),
                    RawPipeline::Async(f) => Callable::Async(f),
                    RawPipeline::Hinge(hinge) => Callable::Command(hinge.as_cmd(true)),
                    RawPipeline::Command(command) => Callable::Command(command.as_cmd(true)),
                };
                Ok(Resolved {
                    tokens: group.ancestry(),
                    initial: group.initial(),
                    callable,
                })
            }
        }
    }
}

impl<T> From<Hinge<T>> for Stage<T> {
    fn from(hinge: Hinge<T>) -> Self {
        Self::Hinge(hinge)
    }
}

impl<T> From<&Hinge<T>> for Stage<T> {
    fn from(hinge: &Hinge<T>) -> Self {
        Self::Hinge(hinge.clone())
    }
}

impl<T> From<Command<T>> for Stage<T> {
    fn from(command: Command<T>) -> Self {
        Self::Command(command)
    }
}

impl<T> From<&Command<T>> for Stage<T> {
    fn from(command: &Command<T>) -> Self {
        Self::Command(command.clone())
    }
}

impl<T> From<Rc<dyn Grouped<T>>> for Stage<T> {
    fn from(group: Rc<dyn Grouped<T>>) -> Self {
        Self::Group(group)
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Sync(..)"),
            Self::Async(_) => f.write_str("Async(..)"),
            Self::Hinge(hinge) => f.debug_tuple("Hinge").field(hinge).finish(),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::Group(_) => f.write_str("Group(..)"),
        }
    }
}

impl<T> fmt::Debug for RawPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Sync(..)"),
            Self::Async(_) => f.write_str("Async(..)"),
            Self::Hinge(hinge) => f.debug_tuple("Hinge").field(hinge).finish(),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
        }
    }
}

/// A stage after unwrapping.
pub(crate) enum Callable<T> {
    Sync(SyncStage<T>),
    Async(AsyncStage<T>),
    Command(Command<T>),
}

impl<T: Clone + 'static> Callable<T> {
    /// Whether invoking this callable produces futures right now.
    pub(crate) fn yields_futures(&self) -> bool {
        match self {
            Self::Sync(_) => false,
            Self::Async(_) => true,
            Self::Command(command) => command.hinge().is_async(),
        }
    }

    pub(crate) fn into_pipe(self) -> Pipe<T> {
        match self {
            Self::Sync(f) => pipe(move |instance, value, token| Outcome::Ready(f(instance, value, token))),
            Self::Async(f) => f,
            Self::Command(command) => {
                pipe(move |instance, value, token| command.call_at(instance, value.cloned(), token))
            }
        }
    }
}

/// Everything a registration contributes to the hinge it is made on.
pub(crate) struct Resolved<T> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) initial: Initial<T>,
    pub(crate) callable: Callable<T>,
}

impl<T> Resolved<T> {
    pub(crate) fn plain(callable: Callable<T>) -> Self {
        Self {
            tokens: Vec::new(),
            initial: Initial::Absent,
            callable,
        }
    }
}
