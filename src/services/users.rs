// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mirrors identity-provider user lifecycle events into the user store.

use crate::db::Store;
use crate::error::Result;
use crate::models::{EventEnvelope, IdentityDeletedPayload, IdentityPayload, UserRecord};
use serde::Serialize;
use std::sync::Arc;

/// How a user event was handled. Every variant is a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The store was mutated.
    Applied,
    /// Update or delete targeted a user that does not exist.
    NotFound,
    /// Envelope had no usable payload; nothing was written.
    Skipped,
}

impl SyncOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOutcome::Applied => "applied",
            SyncOutcome::NotFound => "not_found",
            SyncOutcome::Skipped => "skipped",
        }
    }
}

/// Applies `clerk/user.*` events to the user store.
#[derive(Clone)]
pub struct UserReconciler {
    db: Arc<dyn Store>,
}

impl UserReconciler {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Insert a new user from a `clerk/user.created` event.
    ///
    /// An existing user with the same id is a hard error, not "already synced".
    pub async fn handle_created(&self, event: &EventEnvelope) -> Result<SyncOutcome> {
        let Some(payload) = decode::<IdentityPayload>(event, "sync-user-from-clerk") else {
            return Ok(SyncOutcome::Skipped);
        };

        let user = UserRecord::new(payload.id.clone(), payload.profile());
        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "User created from identity event");
        Ok(SyncOutcome::Applied)
    }

    /// Replace the identity-derived fields from a `clerk/user.updated` event.
    pub async fn handle_updated(&self, event: &EventEnvelope) -> Result<SyncOutcome> {
        let Some(payload) = decode::<IdentityPayload>(event, "update-user-from-clerk") else {
            return Ok(SyncOutcome::Skipped);
        };

        if !self
            .db
            .replace_user_profile(&payload.id, &payload.profile())
            .await?
        {
            tracing::warn!(user_id = %payload.id, "User not found, update skipped");
            return Ok(SyncOutcome::NotFound);
        }

        tracing::info!(user_id = %payload.id, "User updated from identity event");
        Ok(SyncOutcome::Applied)
    }

    /// Remove the user named by a `clerk/user.deleted` event.
    pub async fn handle_deleted(&self, event: &EventEnvelope) -> Result<SyncOutcome> {
        let Some(payload) = decode::<IdentityDeletedPayload>(event, "delete-user-with-clerk")
        else {
            return Ok(SyncOutcome::Skipped);
        };

        if !self.db.delete_user(&payload.id).await? {
            tracing::warn!(user_id = %payload.id, "User not found, delete skipped");
            return Ok(SyncOutcome::NotFound);
        }

        tracing::info!(user_id = %payload.id, "User deleted from identity event");
        Ok(SyncOutcome::Applied)
    }
}

/// Decode an envelope payload, logging and swallowing malformed input.
fn decode<T>(event: &EventEnvelope, function_id: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned + validator::Validate,
{
    match event.payload::<T>() {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(
                function_id,
                event_name = %event.name,
                event_id = ?event.id,
                error = %e,
                "Malformed event, skipping"
            );
            None
        }
    }
}
