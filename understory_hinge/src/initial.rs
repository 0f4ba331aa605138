// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Default values for hinges.

use alloc::rc::Rc;
use core::fmt;

use crate::instance::Instance;

/// Computes a default from the instance being read and, for commands, the
/// argument the command was invoked with.
pub type Factory<T> = Rc<dyn Fn(&Instance, Option<&T>) -> T>;

/// How a hinge fills an empty slot, and what a command returns.
///
/// Reads of an empty slot store the resolved default before returning it.
/// Top-level commands resolve the default after their pipeline finishes and
/// return it; subcommands never resolve it.
///
/// # Example
///
/// ```rust
/// use understory_hinge::{Initial, Instance};
///
/// let record = Instance::new();
///
/// assert_eq!(Initial::<u8>::Absent.resolve(&record, None), None);
/// assert_eq!(Initial::Value(3_u8).resolve(&record, None), Some(3));
///
/// let doubled = Initial::factory(|_, arg: Option<&u8>| arg.map_or(0, |v| v * 2));
/// assert_eq!(doubled.resolve(&record, Some(&4)), Some(8));
/// ```
pub enum Initial<T> {
    /// No default; empty slots stay empty.
    Absent,
    /// A literal default, cloned on each use.
    Value(T),
    /// A computed default.
    Factory(Factory<T>),
}

impl<T> Initial<T> {
    /// Wraps a closure as a factory default.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Instance, Option<&T>) -> T + 'static,
    {
        Self::Factory(Rc::new(f))
    }

    /// Returns `true` for [`Initial::Absent`].
    #[must_use]
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short name of the variant, for diagnostics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Value(_) => "value",
            Self::Factory(_) => "factory",
        }
    }
}

impl<T: Clone> Initial<T> {
    /// Produces the default value, if any.
    ///
    /// Factories are invoked with `instance` and `arg`; literal values are
    /// cloned.
    #[must_use]
    pub fn resolve(&self, instance: &Instance, arg: Option<&T>) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Value(value) => Some(value.clone()),
            Self::Factory(factory) => Some(factory(instance, arg)),
        }
    }
}

impl<T> Default for Initial<T> {
    fn default() -> Self {
        Self::Absent
    }
}

// Manual Clone impl since factories are shared, not cloned
impl<T: Clone> Clone for Initial<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Value(value) => Self::Value(value.clone()),
            Self::Factory(factory) => Self::Factory(Rc::clone(factory)),
        }
    }
}

// Manual Debug impl since factories aren't Debug
impl<T: fmt::Debug> fmt::Debug for Initial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use core::cell::Cell;

    #[test]
    fn default_is_absent() {
        let initial = Initial::<i32>::default();
        assert!(initial.is_absent());
        assert_eq!(initial.kind(), "absent");
        assert_eq!(initial.resolve(&Instance::new(), None), None);
    }

    #[test]
    fn value_is_cloned() {
        let initial = Initial::Value(alloc::string::String::from("hello"));
        let record = Instance::new();
        assert_eq!(initial.resolve(&record, None).as_deref(), Some("hello"));
        assert_eq!(initial.resolve(&record, None).as_deref(), Some("hello"));
    }

    #[test]
    fn factory_runs_per_resolution() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let initial = Initial::factory(move |_, _| {
            counter.set(counter.get() + 1);
            counter.get()
        });

        let record = Instance::new();
        assert_eq!(initial.resolve(&record, None), Some(1));
        assert_eq!(initial.resolve(&record, None), Some(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn factory_sees_instance_and_argument() {
        let token = crate::Token::mint();
        let record = Instance::new();
        record.insert(token, 10_i32);

        let initial = Initial::factory(move |instance: &Instance, arg: Option<&i32>| {
            instance.get::<i32>(token).unwrap_or_default() + arg.copied().unwrap_or_default()
        });
        assert_eq!(initial.resolve(&record, None), Some(10));
        assert_eq!(initial.resolve(&record, Some(&5)), Some(15));
    }

    #[test]
    fn clones_share_the_factory() {
        let initial = Initial::factory(|_, _| 1_u8);
        let copy = initial.clone();
        match (&initial, &copy) {
            (Initial::Factory(a), Initial::Factory(b)) => assert!(Rc::ptr_eq(a, b)),
            _ => panic!("expected factories"),
        }
    }

    #[test]
    fn initial_debug() {
        assert_eq!(format!("{:?}", Initial::<u8>::Absent), "Absent");
        assert_eq!(format!("{:?}", Initial::Value(4_u8)), "Value(4)");
        assert_eq!(format!("{:?}", Initial::factory(|_, _| 4_u8)), "Factory(..)");
    }
}
