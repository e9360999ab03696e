//! Database layer.
//!
//! Handlers talk to a [`Store`]; production runs against Firestore, local
//! development and tests against [`MemoryDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{OrderRecord, UserProfile, UserRecord};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ORDERS: &str = "orders";
}

/// Record store used by the sync handlers.
///
/// Each call is atomic on its own; nothing here coordinates across calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new user. Fails with [`AppError::DuplicateKey`] if the id exists.
    async fn insert_user(&self, user: &UserRecord) -> Result<(), AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, AppError>;

    /// Replace the identity-derived fields of an existing user.
    ///
    /// Returns `false` (and writes nothing) when no user has this id.
    async fn replace_user_profile(&self, id: &str, profile: &UserProfile)
        -> Result<bool, AppError>;

    /// Delete a user. Returns `false` when no user has this id.
    async fn delete_user(&self, id: &str) -> Result<bool, AppError>;

    /// Insert all orders in one write. Either every record is stored or none is.
    async fn insert_orders(&self, orders: &[OrderRecord]) -> Result<usize, AppError>;

    async fn get_orders_for_user(&self, user_id: &str) -> Result<Vec<OrderRecord>, AppError>;
}
