// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{OrderRecord, UserProfile, UserRecord};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// [`Store`] backed by concurrent maps.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, UserRecord>,
    /// Orders keyed by generated document id
    orders: DashMap<String, OrderRecord>,
    /// When set, every call fails as if the backend were unreachable.
    unavailable: AtomicBool,
    bulk_insert_calls: AtomicUsize,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a storage outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `insert_orders` calls that reached the store.
    pub fn bulk_insert_calls(&self) -> usize {
        self.bulk_insert_calls.load(Ordering::SeqCst)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Seed a user directly, bypassing duplicate checks.
    pub fn put_user(&self, user: UserRecord) {
        self.users.insert(user.id.clone(), user);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (simulated outage)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn insert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        self.check_available()?;
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateKey(user.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        self.check_available()?;
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn replace_user_profile(
        &self,
        id: &str,
        profile: &UserProfile,
    ) -> Result<bool, AppError> {
        self.check_available()?;
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.apply_profile(profile.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        self.check_available()?;
        Ok(self.users.remove(id).is_some())
    }

    async fn insert_orders(&self, orders: &[OrderRecord]) -> Result<usize, AppError> {
        self.check_available()?;
        self.bulk_insert_calls.fetch_add(1, Ordering::SeqCst);
        for order in orders {
            self.orders
                .insert(uuid::Uuid::new_v4().to_string(), order.clone());
        }
        Ok(orders.len())
    }

    async fn get_orders_for_user(&self, user_id: &str) -> Result<Vec<OrderRecord>, AppError> {
        self.check_available()?;
        Ok(self
            .orders
            .iter()
            .filter(|o| o.user_id().as_deref() == Some(user_id))
            .map(|o| o.value().clone())
            .collect())
    }
}
