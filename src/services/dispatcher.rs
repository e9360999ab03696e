// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process event dispatcher.
//!
//! Routes envelopes to their registered function without an external event
//! platform:
//! - Single-event functions run immediately, one task per event
//! - `order/created` events collect in a batch window that flushes at
//!   `max_size` events or `timeout` after the first pending event
//! - Failed runs are retried with the same full batch, then recorded

use crate::error::AppError;
use crate::functions::{BatchConfig, FunctionId, Functions, RunOutput};
use crate::models::EventEnvelope;
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, sleep_until, Instant};

const CHANNEL_CAPACITY: usize = 1024;
const FAILED_RUN_HISTORY: usize = 100;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Dispatcher settings.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub order_batch: BatchConfig,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay: Duration,
}

/// A run that exhausted its retries.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub run_id: String,
    pub function_id: String,
    pub event_count: usize,
    pub attempts: u32,
    pub error: String,
    pub failed_at: String,
}

/// Bounded history of failed runs, newest last.
#[derive(Default)]
pub struct RunLog {
    failed: Mutex<VecDeque<FailedRun>>,
}

impl RunLog {
    fn record(&self, run: FailedRun) {
        let mut failed = self.failed.lock().unwrap_or_else(PoisonError::into_inner);
        if failed.len() == FAILED_RUN_HISTORY {
            failed.pop_front();
        }
        failed.push_back(run);
    }

    pub fn failed_runs(&self) -> Vec<FailedRun> {
        self.failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Handle for submitting events. Cheap to clone; the worker stops once every
/// handle is dropped, after flushing the pending batch and finishing in-flight
/// runs.
#[derive(Clone)]
pub struct EventDispatcher {
    tx: mpsc::Sender<EventEnvelope>,
    runs: Arc<RunLog>,
}

struct RunContext {
    functions: Functions,
    runs: Arc<RunLog>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl EventDispatcher {
    /// Spawn the dispatcher worker.
    pub fn start(functions: Functions, config: DispatchConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let runs = Arc::new(RunLog::default());
        let ctx = Arc::new(RunContext {
            functions,
            runs: runs.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        });

        let worker = tokio::spawn(run_loop(rx, ctx, config.order_batch));
        (Self { tx, runs }, worker)
    }

    /// Queue an event for dispatch.
    pub async fn send(&self, event: EventEnvelope) -> Result<(), AppError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Event dispatcher has stopped")))
    }

    pub fn failed_runs(&self) -> Vec<FailedRun> {
        self.runs.failed_runs()
    }

    /// Failed-run history, readable after the dispatcher is gone.
    pub fn run_log(&self) -> Arc<RunLog> {
        self.runs.clone()
    }
}

async fn run_loop(
    mut rx: mpsc::Receiver<EventEnvelope>,
    ctx: Arc<RunContext>,
    batch: BatchConfig,
) {
    let mut pending: Vec<EventEnvelope> = Vec::new();
    let mut deadline: Option<Instant> = None;
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(event) = received else { break };

                match FunctionId::for_event(&event.name) {
                    None => {
                        tracing::debug!(
                            event_name = %event.name,
                            "No function for event, ignoring"
                        );
                    }
                    Some(function) if function.is_batched() => {
                        if pending.is_empty() {
                            deadline = Some(Instant::now() + batch.timeout);
                        }
                        pending.push(event);
                        if pending.len() >= batch.max_size {
                            tracing::debug!(size = pending.len(), "Batch window full");
                            deadline = None;
                            let events = std::mem::take(&mut pending);
                            in_flight.spawn(execute(ctx.clone(), function, events));
                        }
                    }
                    Some(function) => {
                        in_flight.spawn(execute(ctx.clone(), function, vec![event]));
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::debug!(size = pending.len(), "Batch window timed out");
                deadline = None;
                in_flight.spawn(execute(
                    ctx.clone(),
                    FunctionId::CreateUserOrder,
                    std::mem::take(&mut pending),
                ));
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Function run task panicked");
                }
            }
        }
    }

    if !pending.is_empty() {
        tracing::debug!(size = pending.len(), "Flushing batch on shutdown");
        in_flight.spawn(execute(ctx.clone(), FunctionId::CreateUserOrder, pending));
    }
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Function run task panicked");
        }
    }
    tracing::info!("Event dispatcher stopped");
}

/// Run one function invocation, retrying the full event list on failure.
async fn execute(ctx: Arc<RunContext>, function: FunctionId, events: Vec<EventEnvelope>) {
    let run_id = uuid::Uuid::new_v4().to_string();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match ctx.functions.run(function, &events).await {
            Ok(output) => {
                match output {
                    RunOutput::User(outcome) => tracing::debug!(
                        run_id = %run_id,
                        function_id = %function,
                        outcome = outcome.as_str(),
                        "Function run completed"
                    ),
                    RunOutput::Batch(result) => tracing::debug!(
                        run_id = %run_id,
                        function_id = %function,
                        processed = result.processed,
                        "Function run completed"
                    ),
                }
                return;
            }
            Err(e) if attempts <= ctx.max_retries => {
                let delay = retry_delay(ctx.retry_base_delay, attempts);
                tracing::warn!(
                    run_id = %run_id,
                    function_id = %function,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Function run failed, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    run_id = %run_id,
                    function_id = %function,
                    attempts,
                    event_count = events.len(),
                    error = %e,
                    "Function run failed permanently"
                );
                ctx.runs.record(FailedRun {
                    run_id,
                    function_id: function.to_string(),
                    event_count: events.len(),
                    attempts,
                    error: e.to_string(),
                    failed_at: format_utc_rfc3339(chrono::Utc::now()),
                });
                return;
            }
        }
    }
}

/// Exponential backoff for the `attempt`-th failure (1-based).
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}
