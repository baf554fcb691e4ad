//! In-process implementation of the user identity store port.
//!
//! [`InMemoryUserIdentityStore`] mirrors the guarantees of the PostgreSQL
//! adapter closely enough to exercise the coordinator without a database:
//!
//! - Writes are staged per transaction and become visible on commit only.
//! - A handle written by an open transaction is reserved, so a second
//!   transaction writing the same value fails with a unique violation instead
//!   of waiting for the first to finish. At most one of them can commit.
//! - Dropping a transaction without committing releases its reservations and
//!   discards its staged writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{UserIdentityStore, UserIdentityStoreError, UserIdentityTransaction};
use crate::domain::{IdentityChanges, UniqueAttribute, User, UserId};

type TransactionId = u64;

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    reservations: HashMap<(UniqueAttribute, String), TransactionId>,
}

impl StoreState {
    fn committed_holder(&self, attribute: UniqueAttribute, value: &str) -> Option<&UserId> {
        self.users
            .values()
            .find(|user| user.handle(attribute) == Some(value))
            .map(User::id)
    }

    fn release(&mut self, transaction: TransactionId) {
        self.reservations.retain(|_, holder| *holder != transaction);
    }
}

fn lock(state: &Mutex<StoreState>) -> Result<MutexGuard<'_, StoreState>, UserIdentityStoreError> {
    state
        .lock()
        .map_err(|_| UserIdentityStoreError::connection("in-memory store lock poisoned"))
}

/// Thread-safe in-memory user store with unique-index semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserIdentityStore {
    state: Arc<Mutex<StoreState>>,
    next_transaction: Arc<AtomicU64>,
}

impl InMemoryUserIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a committed user, as the registration flow would.
    ///
    /// # Errors
    ///
    /// Returns [`UserIdentityStoreError::UniqueViolation`] when one of the
    /// user's handles is already held by another user.
    pub fn insert(&self, user: User) -> Result<(), UserIdentityStoreError> {
        let mut state = lock(&self.state)?;
        for attribute in UniqueAttribute::ALL {
            let Some(value) = user.handle(attribute) else {
                continue;
            };
            if state
                .committed_holder(attribute, value)
                .is_some_and(|holder| holder != user.id())
            {
                return Err(UserIdentityStoreError::unique_violation(
                    attribute,
                    attribute.default_constraint_name(),
                ));
            }
        }
        state.users.insert(user.id().clone(), user);
        Ok(())
    }

    /// Committed users, in no particular order.
    pub fn users(&self) -> Result<Vec<User>, UserIdentityStoreError> {
        let state = lock(&self.state)?;
        Ok(state.users.values().cloned().collect())
    }
}

#[async_trait]
impl UserIdentityStore for InMemoryUserIdentityStore {
    async fn begin(&self) -> Result<Box<dyn UserIdentityTransaction>, UserIdentityStoreError> {
        let id = self.next_transaction.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(InMemoryTransaction {
            id,
            state: Arc::clone(&self.state),
            staged: HashMap::new(),
        }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserIdentityStoreError> {
        Ok(lock(&self.state)?.users.get(id).cloned())
    }

    async fn find_holder(
        &self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError> {
        Ok(lock(&self.state)?.committed_holder(attribute, value).cloned())
    }
}

struct InMemoryTransaction {
    id: TransactionId,
    state: Arc<Mutex<StoreState>>,
    staged: HashMap<UserId, User>,
}

impl InMemoryTransaction {
    fn visible_user(&self, state: &StoreState, id: &UserId) -> Option<User> {
        self.staged
            .get(id)
            .or_else(|| state.users.get(id))
            .cloned()
    }

    fn claim(
        &self,
        state: &mut StoreState,
        user_id: &UserId,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<(), UserIdentityStoreError> {
        let held_elsewhere = state
            .committed_holder(attribute, value)
            .is_some_and(|holder| holder != user_id)
            || self
                .staged
                .values()
                .any(|user| user.id() != user_id && user.handle(attribute) == Some(value));
        let reserved_elsewhere = state
            .reservations
            .get(&(attribute, value.to_owned()))
            .is_some_and(|holder| *holder != self.id);

        if held_elsewhere || reserved_elsewhere {
            debug!(%attribute, transaction = self.id, "in-memory unique violation");
            return Err(UserIdentityStoreError::unique_violation(
                attribute,
                attribute.default_constraint_name(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserIdentityTransaction for InMemoryTransaction {
    async fn find_holder(
        &mut self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError> {
        let state = lock(&self.state)?;
        if let Some(user) = self
            .staged
            .values()
            .find(|user| user.handle(attribute) == Some(value))
        {
            return Ok(Some(user.id().clone()));
        }
        Ok(state
            .committed_holder(attribute, value)
            .filter(|holder| !self.staged.contains_key(*holder))
            .cloned())
    }

    async fn update_identity(
        &mut self,
        user_id: &UserId,
        changes: &IdentityChanges,
    ) -> Result<User, UserIdentityStoreError> {
        let state_handle = Arc::clone(&self.state);
        let mut state = lock(&state_handle)?;
        let current = self
            .visible_user(&state, user_id)
            .ok_or_else(|| UserIdentityStoreError::not_found(user_id.to_string()))?;

        for (attribute, value) in changes.requested() {
            if current.handle(attribute) != Some(value) {
                self.claim(&mut state, user_id, attribute, value)?;
            }
        }
        for (attribute, value) in changes.requested() {
            state
                .reservations
                .insert((attribute, value.to_owned()), self.id);
        }

        let updated = current.with_identity(changes);
        self.staged.insert(user_id.clone(), updated.clone());
        Ok(updated)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), UserIdentityStoreError> {
        let state_handle = Arc::clone(&self.state);
        let mut state = lock(&state_handle)?;
        for (id, user) in self.staged.drain() {
            state.users.insert(id, user);
        }
        state.release(self.id);
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), UserIdentityStoreError> {
        self.staged.clear();
        lock(&self.state)?.release(self.id);
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            // Releasing after commit or rollback is a no-op; staged writes
            // that were never committed are simply discarded with `self`.
            state.release(self.id);
        }
    }
}
