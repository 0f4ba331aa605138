// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot identification.
//!
//! Every [`Hinge`](crate::Hinge) owns exactly one [`Token`], minted when the
//! hinge is created. The token is the key under which the hinge's value lives
//! on every [`Instance`](crate::Instance).

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh tokens for the whole process.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

/// An opaque, process-unique slot key.
///
/// Tokens can only be obtained from [`Token::mint`], so two tokens compare
/// equal only if one is a copy of the other.
///
/// # Example
///
/// ```rust
/// use understory_hinge::Token;
///
/// let a = Token::mint();
/// let b = Token::mint();
/// assert_ne!(a, b);
/// assert_eq!(a, a);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(u64);

impl Token {
    /// Mints a token that is distinct from every token minted before it.
    #[must_use]
    pub fn mint() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the serial number of this token.
    ///
    /// Serials increase in minting order. They are only meaningful for
    /// diagnostics and ordering; a token cannot be rebuilt from its serial.
    #[must_use]
    #[inline]
    pub const fn serial(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.0).finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec::Vec;

    #[test]
    fn minted_tokens_are_distinct() {
        let tokens: Vec<Token> = (0..64).map(|_| Token::mint()).collect();
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                assert_ne!(a, b, "tokens must never collide");
            }
        }
    }

    #[test]
    fn serials_follow_minting_order() {
        let first = Token::mint();
        let second = Token::mint();
        assert!(first.serial() < second.serial());
        assert!(first < second);
    }

    #[test]
    fn copies_compare_equal() {
        let token = Token::mint();
        let copy = token;
        assert_eq!(token, copy);
    }

    #[test]
    fn token_formatting() {
        let token = Token::mint();
        let serial = token.serial();
        assert_eq!(format!("{token:?}"), format!("Token({serial})"));
        assert_eq!(format!("{token}"), format!("Token({serial})"));
    }

    #[test]
    fn token_size() {
        assert_eq!(core::mem::size_of::<Token>(), 8);
    }
}
