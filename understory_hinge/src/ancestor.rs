// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ancestor lookup along parent links.

use crate::error::HingeError;
use crate::instance::Instance;

/// A node that may link to a parent node of the same kind.
///
/// Implemented for [`Instance`]; other record types can implement it to use
/// [`find_ancestor`] with their own parent links.
pub trait ParentLink: Sized {
    /// Returns the parent node, if any.
    fn parent_link(&self) -> Option<Self>;
}

impl ParentLink for Instance {
    fn parent_link(&self) -> Option<Self> {
        self.parent()
    }
}

/// Walks up from `node` and returns the nearest ancestor matching `of_type`.
///
/// `node` itself is never tested. The walk stops at the first match.
///
/// `do_not_throw` only applies when `node` has no parent at all, in which
/// case `Ok(None)` is returned. Running out of parents further up the chain
/// always fails.
///
/// # Errors
///
/// [`HingeError::AncestorNotFound`] if no ancestor matches.
///
/// # Example
///
/// ```rust
/// use understory_hinge::{Instance, Token, find_ancestor};
///
/// let kind = Token::mint();
/// let root = Instance::new();
/// root.insert(kind, "window");
/// let mid = Instance::child_of(&root);
/// let leaf = Instance::child_of(&mid);
///
/// let is_window = |node: &Instance| node.get::<&str>(kind) == Some("window");
/// let found = find_ancestor(&leaf, is_window, false)?;
/// assert!(found.is_some_and(|found| Instance::ptr_eq(&found, &root)));
///
/// assert!(find_ancestor(&root, |_| false, true)?.is_none());
/// # Ok::<(), understory_hinge::HingeError>(())
/// ```
pub fn find_ancestor<N, P>(node: &N, of_type: P, do_not_throw: bool) -> Result<Option<N>, HingeError>
where
    N: ParentLink,
    P: Fn(&N) -> bool,
{
    let Some(mut current) = node.parent_link() else {
        return if do_not_throw {
            Ok(None)
        } else {
            Err(HingeError::AncestorNotFound)
        };
    };

    loop {
        if of_type(&current) {
            return Ok(Some(current));
        }
        current = current.parent_link().ok_or(HingeError::AncestorNotFound)?;
    }
}
