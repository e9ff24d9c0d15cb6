// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Operators that build new futures from existing ones.
//!
//! Every combinator returns a fresh [`Future`] wired to its input(s) via listeners,
//! with three shared conventions:
//!
//! - **Failure propagation**: an input failure reaches the output unchanged - the
//!   same shared cause instance, not a copy.
//! - **Cancellation propagation**: both ways. Cancelling the output cancels the
//!   input(s); a cancelled input mirrors into the output. The cycle terminates
//!   because a completed future ignores further completion attempts.
//! - **Executor**: the output inherits the first input's executor unless one is
//!   supplied explicitly.
//!
//! [`Future`]: crate::Future

// Attach sources.
pub mod cascade;
pub mod error_recovery;
pub mod flat_map;
pub mod map;
pub mod timeout;
pub mod when_all;
pub mod wiring;
pub mod zip;

// Re-export.
pub use when_all::*;
pub(crate) use wiring::*;
