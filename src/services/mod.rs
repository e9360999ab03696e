// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - event handlers.

pub mod dispatcher;
pub mod orders;
pub mod users;

pub use dispatcher::{DispatchConfig, EventDispatcher, FailedRun};
pub use orders::{BatchResult, OrderBatchIngester};
pub use users::{SyncOutcome, UserReconciler};
