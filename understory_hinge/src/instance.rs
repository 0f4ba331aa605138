// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Schemaless records that hinges read and write.
//!
//! An [`Instance`] is a shared handle over a sparse set of slots keyed by
//! [`Token`], plus an optional link to a parent instance.
//!
//! # Implementation
//!
//! Slots live in a `SmallVec` sorted by token and searched with binary search:
//!
//! - contiguous memory for the handful of slots a typical record carries
//! - no heap allocation for the first few slots
//! - O(log n) lookup
//!
//! Values are type-erased; the typed view is provided by [`Hinge`](crate::Hinge).

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::cell::RefCell;
use core::fmt;

use smallvec::SmallVec;

use crate::error::HingeError;
use crate::token::Token;

/// Most records carry only a few hinges.
const INLINE_CAPACITY: usize = 8;

/// One stored value together with the name of its type, for diagnostics.
struct Slot {
    token: Token,
    value: Box<dyn Any>,
    type_name: &'static str,
}

#[derive(Default)]
struct Record {
    /// Sorted by token.
    slots: SmallVec<[Slot; INLINE_CAPACITY]>,
    parent: Option<Instance>,
}

impl Record {
    #[inline]
    fn find(&self, token: Token) -> Result<usize, usize> {
        self.slots.binary_search_by_key(&token, |slot| slot.token)
    }
}

/// A mutable, schemaless record.
///
/// Cloning an `Instance` produces another handle to the **same** record. Use
/// [`Instance::ptr_eq`] to compare identity.
///
/// Any code holding a [`Token`] may read or write the corresponding slot.
/// There is no locking; `Instance` is `!Send` and meant for single-threaded,
/// cooperative use.
///
/// # Panics
///
/// The record is guarded by a `RefCell`. Mutating an instance from inside the
/// closure passed to [`Instance::with`] panics. No other method holds the
/// borrow while running user code.
///
/// # Example
///
/// ```rust
/// use understory_hinge::{Instance, Token};
///
/// let name = Token::mint();
/// let record = Instance::new();
///
/// assert_eq!(record.get::<&str>(name), None);
/// record.insert(name, "window");
/// assert_eq!(record.get::<&str>(name), Some("window"));
///
/// let alias = record.clone();
/// alias.insert(name, "dialog");
/// assert_eq!(record.get::<&str>(name), Some("dialog"));
/// ```
#[derive(Clone, Default)]
pub struct Instance {
    record: Rc<RefCell<Record>>,
}

impl Instance {
    /// Creates an empty record with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record whose parent link points at `parent`.
    #[must_use]
    pub fn child_of(parent: &Self) -> Self {
        let child = Self::new();
        child.set_parent(Some(parent));
        child
    }

    /// Returns `true` if both handles refer to the same record.
    #[must_use]
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.record, &b.record)
    }

    /// Stores `value` under `token`, replacing whatever was there.
    ///
    /// Returns `true` if a previous value was replaced.
    pub fn insert<T: 'static>(&self, token: Token, value: T) -> bool {
        let slot = Slot {
            token,
            value: Box::new(value),
            type_name: type_name::<T>(),
        };
        let mut record = self.record.borrow_mut();
        match record.find(token) {
            Ok(idx) => {
                record.slots[idx] = slot;
                true
            }
            Err(idx) => {
                record.slots.insert(idx, slot);
                false
            }
        }
    }

    /// Returns a clone of the value under `token`.
    ///
    /// Returns `None` if the slot is empty or holds another type.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, token: Token) -> Option<T> {
        self.try_get(token).ok().flatten()
    }

    /// Returns a clone of the value under `token`, distinguishing an empty
    /// slot from one that holds a value of another type.
    pub fn try_get<T: Clone + 'static>(&self, token: Token) -> Result<Option<T>, HingeError> {
        let record = self.record.borrow();
        let Ok(idx) = record.find(token) else {
            return Ok(None);
        };
        record.slots[idx]
            .value
            .downcast_ref::<T>()
            .map(|value| Some(value.clone()))
            .ok_or(HingeError::SlotType {
                token,
                expected: type_name::<T>(),
            })
    }

    /// Calls `f` with a borrow of the value under `token`.
    ///
    /// `f` receives `None` if the slot is empty or holds another type.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this instance.
    pub fn with<T: 'static, R>(&self, token: Token, f: impl FnOnce(Option<&T>) -> R) -> R {
        let record = self.record.borrow();
        let value = record
            .find(token)
            .ok()
            .and_then(|idx| record.slots[idx].value.downcast_ref::<T>());
        f(value)
    }

    /// Empties the slot under `token`.
    ///
    /// Returns `true` if a value was removed.
    pub fn remove(&self, token: Token) -> bool {
        let mut record = self.record.borrow_mut();
        if let Ok(idx) = record.find(token) {
            record.slots.remove(idx);
            true
        } else {
            false
        }
    }

    /// Returns `true` if a value is stored under `token`.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.record.borrow().find(token).is_ok()
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.record.borrow().slots.len()
    }

    /// Returns `true` if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record.borrow().slots.is_empty()
    }

    /// Returns the tokens of all occupied slots, in minting order.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.record.borrow().slots.iter().map(|slot| slot.token).collect()
    }

    /// Returns the parent link, if one is set.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.record.borrow().parent.clone()
    }

    /// Sets or clears the parent link.
    ///
    /// The link is strong: a child keeps its parent alive. Parents should not
    /// store their children in slots unless the cycle is broken by hand.
    pub fn set_parent(&self, parent: Option<&Self>) {
        self.record.borrow_mut().parent = parent.cloned();
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.borrow();
        f.debug_struct("Instance")
            .field(
                "slots",
                &record
                    .slots
                    .iter()
                    .map(|slot| (slot.token, slot.type_name))
                    .collect::<Vec<_>>(),
            )
            .field("has_parent", &record.parent.is_some())
            .finish()
    }
}
