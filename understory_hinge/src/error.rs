// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by registration, evaluation and ancestor lookup.

use alloc::boxed::Box;
use core::error::Error as CoreError;

use thiserror::Error;

use crate::token::Token;

/// Errors produced by hinges, commands and ancestor lookup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HingeError {
    /// A merged stage had nothing callable left after unwrapping.
    ///
    /// Returned at registration time, before any invocation.
    #[error("stage must be a function")]
    MissingCallable,

    /// A stage registered as asynchronous produced a ready value instead of a
    /// pending one.
    ///
    /// Reported to whoever invoked the pipeline.
    #[error("stage must be awaitable")]
    NotAwaitable,

    /// The parent chain ended without a match.
    #[error("cannot find ancestor with the requested type")]
    AncestorNotFound,

    /// A slot holds a value of a different type than the one requested.
    #[error("slot {token} does not hold a `{expected}`")]
    SlotType {
        /// The slot that was read.
        token: Token,
        /// The type the reader asked for.
        expected: &'static str,
    },

    /// An outcome was demanded synchronously but its pipeline suspended.
    #[error("pipeline suspended; await the outcome instead")]
    NotReady,

    /// A user stage failed.
    #[error("stage failed: {0}")]
    Stage(#[source] Box<dyn CoreError + 'static>),
}

impl HingeError {
    /// Wraps an arbitrary error raised inside a stage.
    pub fn stage(err: impl CoreError + 'static) -> Self {
        Self::Stage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use core::error::Error as _;
    use core::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl CoreError for Refused {}

    #[test]
    fn messages() {
        assert_eq!(
            HingeError::MissingCallable.to_string(),
            "stage must be a function"
        );
        assert_eq!(HingeError::NotAwaitable.to_string(), "stage must be awaitable");
        assert_eq!(
            HingeError::AncestorNotFound.to_string(),
            "cannot find ancestor with the requested type"
        );
    }

    #[test]
    fn stage_error_keeps_source() {
        let err = HingeError::stage(Refused);
        assert_eq!(err.to_string(), "stage failed: refused");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("refused"));
    }
}
