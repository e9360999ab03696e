// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turns a batch of `order/created` events into one bulk insert.

use crate::db::Store;
use crate::error::Result;
use crate::models::{EventEnvelope, OrderRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Value returned to the dispatcher after a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub processed: usize,
}

/// Ingests windowed batches of order events.
#[derive(Clone)]
pub struct OrderBatchIngester {
    db: Arc<dyn Store>,
}

impl OrderBatchIngester {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Map every event to an [`OrderRecord`] and insert them in one call.
    ///
    /// Payload fields are not validated. A store failure fails the whole batch;
    /// the dispatcher redelivers it in full.
    pub async fn handle_batch(&self, events: &[EventEnvelope]) -> Result<BatchResult> {
        let orders: Vec<OrderRecord> = events
            .iter()
            .map(|event| OrderRecord::from_event_data(event.data.as_ref()))
            .collect();

        if orders.is_empty() {
            tracing::debug!("Empty order batch, nothing to insert");
            return Ok(BatchResult {
                success: true,
                processed: 0,
            });
        }

        let processed = self.db.insert_orders(&orders).await?;

        tracing::info!(processed, "Order batch inserted");

        Ok(BatchResult {
            success: true,
            processed,
        })
    }
}
