// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commands: hinges invoked for their pipeline, returning their default.

use core::fmt;

use crate::hinge::Hinge;
use crate::initial::Initial;
use crate::instance::Instance;
use crate::outcome::Outcome;
use crate::token::Token;

/// A hinge adapted into a "run the pipeline, then produce a result" operation.
///
/// Invoking a command runs the hinge's pipeline without writing the slot.
/// Once the pipeline finishes:
///
/// - a **top-level** command resolves the hinge's default and returns it,
///   calling a factory with the instance and the command argument;
/// - a **subcommand** returns `None` and never touches the default.
///
/// Hinges merged into other hinges run as subcommands, so only the outermost
/// command of a composition supplies the final result.
///
/// The pipeline, mode and default are read from the hinge each time the
/// command runs, so stages registered after [`Hinge::as_cmd`] take part.
///
/// # Example
///
/// ```rust
/// use understory_hinge::{Hinge, Initial, Instance};
///
/// let count = Hinge::with_value(0_u32);
/// let (reader, writer) = (count.clone(), count.clone());
///
/// let increment = Hinge::from_initial(Initial::factory(move |instance, _| {
///     reader.get(instance).now().ok().flatten().unwrap_or_default()
/// }))
/// .then_sync(move |instance, _, _| {
///     let next = writer.get(instance).now()?.unwrap_or_default() + 1;
///     writer.set(instance, next).now()
/// })
/// .as_cmd(false);
///
/// let record = Instance::new();
/// assert_eq!(increment.call(&record, None).now()?, Some(1));
/// assert_eq!(increment.call(&record, None).now()?, Some(2));
/// # Ok::<(), understory_hinge::HingeError>(())
/// ```
pub struct Command<T> {
    hinge: Hinge<T>,
    subcommand: bool,
}

impl<T: Clone + 'static> Command<T> {
    pub(crate) fn new(hinge: Hinge<T>, subcommand: bool) -> Self {
        Self { hinge, subcommand }
    }

    /// Returns the hinge this command runs.
    #[must_use]
    #[inline]
    pub fn hinge(&self) -> &Hinge<T> {
        &self.hinge
    }

    /// Returns `true` if this command suppresses its default.
    #[must_use]
    #[inline]
    pub fn is_subcommand(&self) -> bool {
        self.subcommand
    }

    /// Adapts the underlying hinge again, as a top-level command or a
    /// subcommand.
    #[must_use]
    pub fn as_cmd(&self, subcommand: bool) -> Self {
        self.hinge.as_cmd(subcommand)
    }

    /// Runs the command against the hinge's own token.
    pub fn call(&self, instance: &Instance, value: Option<T>) -> Outcome<Option<T>> {
        self.call_at(instance, value, self.hinge.token())
    }

    /// Runs the command against `token`.
    pub fn call_at(&self, instance: &Instance, value: Option<T>, token: Token) -> Outcome<Option<T>> {
        let (pipeline, is_async, initial) = self.hinge.parts();
        let initial = if self.subcommand {
            Initial::Absent
        } else {
            initial
        };

        tracing::trace!(
            token = %token,
            subcommand = self.subcommand,
            is_async,
            "hinge.command"
        );

        let ran = match &pipeline {
            Some(pipeline) => pipeline(instance, value.as_ref(), token).lift_if(is_async),
            None => Outcome::ok(None),
        };
        let instance = instance.clone();
        ran.and_then(move |_| Outcome::ok(initial.resolve(&instance, value.as_ref())))
    }
}

// Manual Clone impl since the handle is shared regardless of `T`
impl<T> Clone for Command<T> {
    fn clone(&self) -> Self {
        Self {
            hinge: self.hinge.clone(),
            subcommand: self.subcommand,
        }
    }
}

impl<T> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("hinge", &self.hinge)
            .field("subcommand", &self.subcommand)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HingeError;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use futures::executor::block_on;

    #[test]
    fn top_level_command_returns_default() {
        let command = Hinge::with_value(5_i32).as_cmd(false);
        assert!(!command.is_subcommand());
        assert_eq!(command.call(&Instance::new(), None).now().ok(), Some(Some(5)));
    }

    #[test]
    fn subcommand_returns_nothing() {
        let command = Hinge::with_value(5_i32).as_cmd(true);
        assert!(command.is_subcommand());
        assert_eq!(command.call(&Instance::new(), None).now().ok(), Some(None));
    }

    #[test]
    fn subcommand_never_invokes_factory() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let hinge = Hinge::with_factory(move |_| {
            counter.set(counter.get() + 1);
            1_i32
        });

        let _ = hinge.as_cmd(true).call(&Instance::new(), Some(3));
        assert_eq!(calls.get(), 0);

        let _ = hinge.as_cmd(false).call(&Instance::new(), Some(3));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn factory_receives_the_argument() {
        let command = Hinge::from_initial(Initial::factory(|_, arg: Option<&i32>| {
            arg.copied().unwrap_or_default() * 3
        }))
        .as_cmd(false);
        assert_eq!(command.call(&Instance::new(), Some(4)).now().ok(), Some(Some(12)));
        assert_eq!(command.call(&Instance::new(), None).now().ok(), Some(Some(0)));
    }

    #[test]
    fn command_runs_pipeline_without_writing_the_slot() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let hinge = Hinge::<i32>::new().then_sync(move |_, value, _| {
            s.borrow_mut().push(value.copied());
            Ok(Some(99))
        });

        let record = Instance::new();
        let result = hinge.as_cmd(false).call(&record, Some(2)).now();
        assert_eq!(result.ok(), Some(None));
        assert_eq!(*seen.borrow(), vec![Some(2)]);
        assert!(!record.contains(hinge.token()));
    }

    #[test]
    fn command_passes_no_value_through() {
        let seen = Rc::new(Cell::new(Some(0)));
        let s = Rc::clone(&seen);
        let hinge = Hinge::<i32>::new().then_sync(move |_, value, _| {
            s.set(value.copied());
            Ok(None)
        });
        let _ = hinge.as_cmd(false).call(&Instance::new(), None);
        assert_eq!(seen.get(), None);
    }

    #[test]
    fn command_reads_hinge_live() {
        let hinge = Hinge::<i32>::new();
        let command = hinge.as_cmd(false);

        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let _ = hinge.then_sync(move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(None)
        });

        let _ = command.call(&Instance::new(), Some(1));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn async_command_resolves_after_pipeline() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&order);
        let d = Rc::clone(&order);
        let hinge = Hinge::from_initial(Initial::factory(move |_, _| {
            d.borrow_mut().push("default");
            7_i32
        }))
        .then_async(move |_, _, _| {
            let o = Rc::clone(&o);
            Outcome::pending(async move {
                o.borrow_mut().push("stage");
                Ok(None)
            })
        });

        let outcome = hinge.as_cmd(false).call(&Instance::new(), None);
        assert!(outcome.is_pending());
        assert!(order.borrow().is_empty());
        assert_eq!(block_on(outcome).ok(), Some(Some(7)));
        assert_eq!(*order.borrow(), vec!["stage", "default"]);
    }

    #[test]
    fn command_failure_skips_default() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let hinge = Hinge::with_factory(move |_| {
            counter.set(counter.get() + 1);
            0_i32
        })
        .then_sync(|_, _, _| Err(HingeError::NotAwaitable));

        let result = hinge.as_cmd(false).call(&Instance::new(), None).now();
        assert!(matches!(result, Err(HingeError::NotAwaitable)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn as_cmd_rewraps() {
        let hinge = Hinge::with_value(1_i32);
        let sub = hinge.as_cmd(false).as_cmd(true);
        assert!(sub.is_subcommand());
        assert!(Hinge::ptr_eq(sub.hinge(), &hinge));
    }

    #[test]
    fn call_at_runs_on_given_token() {
        let other = Token::mint();
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);
        let hinge = Hinge::<i32>::new().then_sync(move |_, _, token| {
            s.set(Some(token));
            Ok(None)
        });
        let _ = hinge.as_cmd(true).call_at(&Instance::new(), Some(1), other);
        assert_eq!(seen.get(), Some(other));
    }
}
