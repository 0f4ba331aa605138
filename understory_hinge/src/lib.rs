// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Hinge: composable read/write slots on plain records.
//!
//! A [`Hinge<T>`] is a named slot definition that can be attached to any
//! [`Instance`]. Reading or writing the slot runs a pipeline of stages
//! registered on the hinge, in registration order.
//!
//! ## Core Concepts
//!
//! - [`Token`]: the unique key a hinge stores its value under.
//! - [`Instance`]: a type-erased record of slots, with an optional parent link.
//! - [`Hinge`]: slot access plus a pipeline of synchronous and asynchronous
//!   stages. Hinges can be merged into each other as stages.
//! - [`Command`]: a hinge invoked for its pipeline, returning its default.
//! - [`find_ancestor`]: walks parent links to the nearest matching instance.
//!
//! Results come back as an [`Outcome`], which is either ready or pending on a
//! future, and can be awaited in both cases.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_hinge::{Hinge, Instance, Outcome};
//!
//! let record = Instance::new();
//!
//! // A slot with a default and a stage that reacts to writes.
//! let celsius = Hinge::with_value(20.0_f64);
//! let fahrenheit = Hinge::<f64>::new();
//! let f = fahrenheit.clone();
//! let _ = celsius.then_sync(move |instance, value, _| {
//!     let c = value.copied().unwrap_or_default();
//!     f.set(instance, c * 9.0 / 5.0 + 32.0).now()?;
//!     Ok(None)
//! });
//!
//! // The first read stores the default and runs the pipeline once.
//! assert_eq!(celsius.get(&record).now()?, Some(20.0));
//! assert_eq!(fahrenheit.get(&record).now()?, Some(68.0));
//!
//! celsius.set(&record, 100.0).now()?;
//! assert_eq!(fahrenheit.get(&record).now()?, Some(212.0));
//!
//! // Asynchronous stages switch the hinge to returning pending outcomes.
//! let slow = Hinge::<f64>::new().then_async(|_, value, _| {
//!     let value = value.copied();
//!     Outcome::pending(async move { Ok(value.map(f64::sqrt)) })
//! });
//! let root = futures::executor::block_on(slow.set(&record, 16.0))?;
//! assert_eq!(root, Some(4.0));
//! # Ok::<(), understory_hinge::HingeError>(())
//! ```
//!
//! ## Diagnostics
//!
//! [`Hinge::debug`] stages emit `tracing` events under [`DEBUG_TARGET`].
//! Registration and command invocation emit `TRACE` events as well.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (on by default)
//! only forwards to the dependencies' `std` features.

#![no_std]

extern crate alloc;

mod ancestor;
mod command;
mod error;
mod hinge;
mod initial;
mod instance;
mod outcome;
mod stage;
mod token;

pub use ancestor::{ParentLink, find_ancestor};
pub use command::Command;
pub use error::HingeError;
pub use hinge::{DEBUG_TARGET, DEFAULT_DEBUG_TAG, Hinge};
pub use initial::{Factory, Initial};
pub use instance::Instance;
pub use outcome::{HingeFuture, Outcome};
pub use stage::{AsyncStage, Grouped, RawPipeline, Stage, SyncStage};
pub use token::Token;
