//! Port for transactional persistence of user identity attributes.
//!
//! Adapters must enforce uniqueness of graffiti, Discord and Telegram handles
//! with at least read-committed isolation: when two transactions claim the
//! same value, at most one commits and the other observes
//! [`UserIdentityStoreError::UniqueViolation`]. Violations carry the attribute
//! whenever the adapter can classify the constraint, so the domain never
//! parses storage-engine error text.

use async_trait::async_trait;

use crate::domain::{IdentityChanges, UniqueAttribute, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user identity store adapters.
    pub enum UserIdentityStoreError {
        /// Store connection could not be established or was lost.
        Connection { message: String } => "user store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user store query failed: {message}",
        /// The targeted user record does not exist.
        NotFound { user_id: String } => "user {user_id} not found",
        /// A uniqueness constraint rejected the write.
        UniqueViolation { attribute: Option<UniqueAttribute>, constraint: String } =>
            "unique constraint {constraint} violated",
    }
}

/// Store of user records with unique identity attributes.
#[async_trait]
pub trait UserIdentityStore: Send + Sync {
    /// Open a transaction.
    ///
    /// The returned transaction rolls back unless [`UserIdentityTransaction::commit`]
    /// completes, including when it is dropped mid-flight.
    async fn begin(&self) -> Result<Box<dyn UserIdentityTransaction>, UserIdentityStoreError>;

    /// Fetch a committed user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserIdentityStoreError>;

    /// Identifier of the committed user holding `value` for `attribute`.
    async fn find_holder(
        &self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError>;
}

/// Unit of work opened by [`UserIdentityStore::begin`].
#[async_trait]
pub trait UserIdentityTransaction: Send {
    /// Identifier of the user holding `value` for `attribute`, as visible to
    /// this transaction.
    async fn find_holder(
        &mut self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError>;

    /// Apply `changes` to the user and return the record as written.
    ///
    /// Fails with [`UserIdentityStoreError::NotFound`] when the user is gone
    /// and with [`UserIdentityStoreError::UniqueViolation`] when a handle is
    /// already held by another record.
    async fn update_identity(
        &mut self,
        user_id: &UserId,
        changes: &IdentityChanges,
    ) -> Result<User, UserIdentityStoreError>;

    /// Make the transaction's writes visible to other readers.
    async fn commit(self: Box<Self>) -> Result<(), UserIdentityStoreError>;

    /// Discard the transaction's writes.
    async fn rollback(self: Box<Self>) -> Result<(), UserIdentityStoreError>;
}
