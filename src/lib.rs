// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! QuickCart sync: mirrors identity-provider users and batches new orders
//! into the application's document store.
//!
//! Event handlers are exposed to an external event platform over HTTP and can
//! also be driven by the in-process dispatcher.

pub mod config;
pub mod db;
pub mod error;
pub mod functions;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use functions::{BatchConfig, EventClient, Functions};
use services::{DispatchConfig, EventDispatcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay before the first dispatcher retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub client: EventClient,
    pub functions: Functions,
    pub dispatcher: EventDispatcher,
}

impl AppState {
    /// Wire up handlers and start the in-process dispatcher.
    ///
    /// The returned handle completes once the state (and every dispatcher
    /// clone) has been dropped and in-flight runs have finished.
    pub fn new(config: Config, db: Arc<dyn Store>) -> (Self, JoinHandle<()>) {
        let order_batch = BatchConfig {
            max_size: config.order_batch_max_size,
            timeout: config.order_batch_timeout,
        };
        let client = EventClient::new(config.app_id.clone(), order_batch);
        let functions = Functions::new(db.clone());
        let (dispatcher, worker) = EventDispatcher::start(
            functions.clone(),
            DispatchConfig {
                order_batch,
                max_retries: config.dispatch_max_retries,
                retry_base_delay: RETRY_BASE_DELAY,
            },
        );

        let state = Self {
            config,
            db,
            client,
            functions,
            dispatcher,
        };
        (state, worker)
    }
}
