// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod order;
pub mod user;

pub use event::{EventEnvelope, IdentityDeletedPayload, IdentityPayload, PayloadError};
pub use order::OrderRecord;
pub use user::{UserProfile, UserRecord};
