// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Function registry: which handler runs for which event, and how.
//!
//! [`EventClient`] describes the functions to the event platform;
//! [`Functions`] executes them.

use crate::db::Store;
use crate::error::Result;
use crate::models::event::names;
use crate::models::EventEnvelope;
use crate::services::{BatchResult, OrderBatchIngester, SyncOutcome, UserReconciler};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Registered function identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    SyncUserCreation,
    SyncUserUpdate,
    SyncUserDeletion,
    CreateUserOrder,
}

impl FunctionId {
    pub const ALL: [FunctionId; 4] = [
        FunctionId::SyncUserCreation,
        FunctionId::SyncUserUpdate,
        FunctionId::SyncUserDeletion,
        FunctionId::CreateUserOrder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionId::SyncUserCreation => "sync-user-from-clerk",
            FunctionId::SyncUserUpdate => "update-user-from-clerk",
            FunctionId::SyncUserDeletion => "delete-user-with-clerk",
            FunctionId::CreateUserOrder => "create-user-order",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == id)
    }

    /// Event name this function is triggered by.
    pub fn event_name(self) -> &'static str {
        match self {
            FunctionId::SyncUserCreation => names::USER_CREATED,
            FunctionId::SyncUserUpdate => names::USER_UPDATED,
            FunctionId::SyncUserDeletion => names::USER_DELETED,
            FunctionId::CreateUserOrder => names::ORDER_CREATED,
        }
    }

    /// Function subscribed to `event_name`, if any.
    pub fn for_event(event_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.event_name() == event_name)
    }

    pub fn is_batched(self) -> bool {
        matches!(self, FunctionId::CreateUserOrder)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch window for a batched trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_size: usize,
    pub timeout: Duration,
}

/// Batch window as advertised to the platform (`timeout` like `"5s"`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEvents {
    pub max_size: usize,
    pub timeout: String,
}

impl From<BatchConfig> for BatchEvents {
    fn from(config: BatchConfig) -> Self {
        let millis = config.timeout.as_millis();
        let timeout = if millis % 1000 == 0 {
            format!("{}s", millis / 1000)
        } else {
            format!("{}ms", millis)
        };
        Self {
            max_size: config.max_size,
            timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub event: &'static str,
}

/// One entry of the registration document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRegistration {
    pub id: &'static str,
    pub triggers: Vec<Trigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_events: Option<BatchEvents>,
}

/// Registration document served to the event platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub app_id: String,
    pub functions: Vec<FunctionRegistration>,
}

/// Event platform client: app identity plus the batch window for orders.
///
/// Built once in `main` and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct EventClient {
    app_id: String,
    order_batch: BatchConfig,
}

impl EventClient {
    pub fn new(app_id: impl Into<String>, order_batch: BatchConfig) -> Self {
        Self {
            app_id: app_id.into(),
            order_batch,
        }
    }

    /// Batch window of `function`, `None` for single-event functions.
    pub fn batch_config(&self, function: FunctionId) -> Option<BatchConfig> {
        function.is_batched().then_some(self.order_batch)
    }

    pub fn registration(&self) -> Registration {
        Registration {
            app_id: self.app_id.clone(),
            functions: FunctionId::ALL
                .into_iter()
                .map(|f| FunctionRegistration {
                    id: f.as_str(),
                    triggers: vec![Trigger {
                        event: f.event_name(),
                    }],
                    batch_events: self.batch_config(f).map(BatchEvents::from),
                })
                .collect(),
        }
    }
}

/// Result of one function run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutput {
    User(SyncOutcome),
    Batch(BatchResult),
}

/// Handlers, ready to run.
#[derive(Clone)]
pub struct Functions {
    users: UserReconciler,
    orders: OrderBatchIngester,
}

impl Functions {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self {
            users: UserReconciler::new(db.clone()),
            orders: OrderBatchIngester::new(db),
        }
    }

    /// Run `function` against `events`.
    ///
    /// Single-event functions use the first event; with no event at all the
    /// run is skipped like any other envelope without data.
    pub async fn run(&self, function: FunctionId, events: &[EventEnvelope]) -> Result<RunOutput> {
        let outcome = match (function, events.first()) {
            (FunctionId::CreateUserOrder, _) => {
                return Ok(RunOutput::Batch(self.orders.handle_batch(events).await?));
            }
            (_, None) => {
                tracing::error!(function_id = %function, "Run without an event, skipping");
                SyncOutcome::Skipped
            }
            (FunctionId::SyncUserCreation, Some(event)) => self.users.handle_created(event).await?,
            (FunctionId::SyncUserUpdate, Some(event)) => self.users.handle_updated(event).await?,
            (FunctionId::SyncUserDeletion, Some(event)) => self.users.handle_deleted(event).await?,
        };
        Ok(RunOutput::User(outcome))
    }
}
