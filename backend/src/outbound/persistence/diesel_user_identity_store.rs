//! PostgreSQL-backed `UserIdentityStore` implementation using Diesel ORM.
//!
//! Uniqueness of graffiti and chat handles is enforced by the named unique
//! indexes on `users`. Violations are classified into a [`UniqueAttribute`]
//! through the store's [`UniqueConstraintMap`], so the coordinator never sees
//! PostgreSQL error text.
//!
//! Transactions own a pooled connection for their whole lifetime and are
//! driven through diesel-async's `AnsiTransactionManager`. A transaction that
//! is dropped before commit or rollback leaves its connection inside an open
//! transaction; the pool discards such connections and PostgreSQL rolls the
//! work back when the session ends.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{UserIdentityStore, UserIdentityStoreError, UserIdentityTransaction};
use crate::domain::{IdentityChanges, UniqueAttribute, UniqueConstraintMap, User, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation_details};
use super::models::{IdentityChangeset, UserRow};
use super::pool::{DbPool, OwnedConnection, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserIdentityStore` port.
#[derive(Clone)]
pub struct DieselUserIdentityStore {
    pool: DbPool,
    constraints: Arc<UniqueConstraintMap>,
}

impl DieselUserIdentityStore {
    /// Create a store that recognises the default `uq_users_on_*` indexes.
    pub fn new(pool: DbPool) -> Self {
        Self::with_constraints(pool, UniqueConstraintMap::postgres_default())
    }

    /// Create a store with an explicit constraint classification table.
    pub fn with_constraints(pool: DbPool, constraints: UniqueConstraintMap) -> Self {
        Self {
            pool,
            constraints: Arc::new(constraints),
        }
    }
}

fn store_pool_error(error: PoolError) -> UserIdentityStoreError {
    map_pool_error(error, UserIdentityStoreError::connection)
}

/// Map Diesel errors, classifying uniqueness violations by constraint.
fn store_diesel_error(
    constraints: &UniqueConstraintMap,
    error: diesel::result::Error,
) -> UserIdentityStoreError {
    if let Some((constraint, message)) = unique_violation_details(&error) {
        let attribute = constraints.classify(constraint, message);
        let constraint = constraint.unwrap_or("unknown").to_owned();
        if attribute.is_none() {
            warn!(%constraint, message, "unrecognised unique violation on users");
        } else {
            debug!(%constraint, ?attribute, "unique violation on users");
        }
        return UserIdentityStoreError::UniqueViolation {
            attribute,
            constraint,
        };
    }
    map_diesel_error(
        error,
        UserIdentityStoreError::query,
        UserIdentityStoreError::connection,
    )
}

async fn load_holder(
    conn: &mut AsyncPgConnection,
    attribute: UniqueAttribute,
    value: &str,
) -> QueryResult<Option<Uuid>> {
    let query = users::table.select(users::id).into_boxed();
    let query = match attribute {
        UniqueAttribute::Graffiti => query.filter(users::graffiti.eq(value)),
        UniqueAttribute::Discord => query.filter(users::discord.eq(value)),
        UniqueAttribute::Telegram => query.filter(users::telegram.eq(value)),
    };
    query.first::<Uuid>(conn).await.optional()
}

#[async_trait]
impl UserIdentityStore for DieselUserIdentityStore {
    async fn begin(&self) -> Result<Box<dyn UserIdentityTransaction>, UserIdentityStoreError> {
        let mut conn = self.pool.get_owned().await.map_err(store_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(|err| store_diesel_error(&self.constraints, err))?;

        Ok(Box::new(DieselUserIdentityTransaction {
            conn,
            constraints: Arc::clone(&self.constraints),
        }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserIdentityStoreError> {
        let mut conn = self.pool.get().await.map_err(store_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| store_diesel_error(&self.constraints, err))?;

        Ok(row.map(User::from))
    }

    async fn find_holder(
        &self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError> {
        let mut conn = self.pool.get().await.map_err(store_pool_error)?;
        let holder = load_holder(&mut conn, attribute, value)
            .await
            .map_err(|err| store_diesel_error(&self.constraints, err))?;
        Ok(holder.map(UserId::from_uuid))
    }
}

/// Open transaction on a connection owned until commit or rollback.
struct DieselUserIdentityTransaction {
    conn: OwnedConnection,
    constraints: Arc<UniqueConstraintMap>,
}

impl DieselUserIdentityTransaction {
    fn map_error(&self, error: diesel::result::Error) -> UserIdentityStoreError {
        store_diesel_error(&self.constraints, error)
    }
}

#[async_trait]
impl UserIdentityTransaction for DieselUserIdentityTransaction {
    async fn find_holder(
        &mut self,
        attribute: UniqueAttribute,
        value: &str,
    ) -> Result<Option<UserId>, UserIdentityStoreError> {
        let holder = load_holder(&mut self.conn, attribute, value).await;
        Ok(holder.map_err(|err| self.map_error(err))?.map(UserId::from_uuid))
    }

    async fn update_identity(
        &mut self,
        user_id: &UserId,
        changes: &IdentityChanges,
    ) -> Result<User, UserIdentityStoreError> {
        let changeset = IdentityChangeset::new(changes, Utc::now());

        let updated: Option<UserRow> = diesel::update(users::table.find(*user_id.as_uuid()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut *self.conn)
            .await
            .optional()
            .map_err(|err| self.map_error(err))?;

        updated
            .map(User::from)
            .ok_or_else(|| UserIdentityStoreError::not_found(user_id.to_string()))
    }

    async fn commit(mut self: Box<Self>) -> Result<(), UserIdentityStoreError> {
        let result = AnsiTransactionManager::commit_transaction(&mut *self.conn).await;
        result.map_err(|err| self.map_error(err))
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), UserIdentityStoreError> {
        let result = AnsiTransactionManager::rollback_transaction(&mut *self.conn).await;
        result.map_err(|err| self.map_error(err))
    }
}
