// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the [`Store`] operations for:
//! - Users (mirrored identity profiles, keyed by identity id)
//! - Orders (append-only, written in batches)

use crate::db::{collections, Store};
use crate::error::AppError;
use crate::models::{OrderRecord, UserProfile, UserRecord};
use async_trait::async_trait;
use firestore::errors::FirestoreError;

/// Firestore rejects transactions with more than 500 writes.
const MAX_TRANSACTION_WRITES: usize = 500;

/// Field mask for a profile replace; `cartItems` is left alone.
const PROFILE_FIELDS: [&str; 3] = ["email", "name", "imageUrl"];

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn insert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let _: UserRecord = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => AppError::DuplicateKey(user.id.clone()),
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn replace_user_profile(
        &self,
        id: &str,
        profile: &UserProfile,
    ) -> Result<bool, AppError> {
        // A masked update would create a partial document if the user is gone,
        // so check existence first. Not atomic: a delete landing between the
        // read and the update still leaves a document holding only the
        // profile fields.
        if self.get_user(id).await?.is_none() {
            return Ok(false);
        }

        let _: UserRecord = self
            .get_client()?
            .fluent()
            .update()
            .fields(PROFILE_FIELDS)
            .in_col(collections::USERS)
            .document_id(id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        // Firestore deletes of missing documents succeed silently.
        if self.get_user(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Order Operations ────────────────────────────────────────

    /// Write all orders in a single transaction so the batch lands whole or
    /// not at all.
    async fn insert_orders(&self, orders: &[OrderRecord]) -> Result<usize, AppError> {
        if orders.len() > MAX_TRANSACTION_WRITES {
            return Err(AppError::BadRequest(format!(
                "Batch of {} orders exceeds the {} write limit",
                orders.len(),
                MAX_TRANSACTION_WRITES
            )));
        }

        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for order in orders {
            let doc_id = uuid::Uuid::new_v4().to_string();
            client
                .fluent()
                .update()
                .in_col(collections::ORDERS)
                .document_id(&doc_id)
                .object(order)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add order to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit order batch: {}", e)))?;

        tracing::debug!(count = orders.len(), "Order batch committed");

        Ok(orders.len())
    }

    async fn get_orders_for_user(&self, user_id: &str) -> Result<Vec<OrderRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ORDERS)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
