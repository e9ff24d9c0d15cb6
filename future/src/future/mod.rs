// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod async_adapter;
pub mod future_blocking;
pub mod future_core;
pub mod future_listeners;
pub mod progressive;
pub mod shared_state;

// Re-export.
pub use async_adapter::*;
pub use future_blocking::*;
pub use future_core::*;
pub use progressive::*;
pub(crate) use shared_state::*;
