//! Identity update coordinator.
//!
//! [`UsersUpdater`] is the only entry point for changing a user's graffiti,
//! Discord handle or Telegram handle. Each call runs one store transaction
//! that either commits every requested change or none of them.
//!
//! Uniqueness is delegated to the store: the in-transaction holder lookup
//! only produces an early, field-scoped rejection, while the store's unique
//! indexes decide races between concurrent writers.
//!
//! # Ledger precondition window
//!
//! The main-chain count for the current graffiti is read after the
//! transaction opens and before the write, but the ledger is a separate
//! resource. A block committed under the old graffiti between the count and
//! the write is not observed, so the graffiti may still change in that
//! window. Closing it needs the count to be a consistent read inside the
//! store transaction; no lock is taken here to emulate that.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::domain::ports::{
    LedgerQuery, LedgerQueryError, UserIdentityStore, UserIdentityStoreError,
    UserIdentityTransaction,
};
use crate::domain::{Error, IdentityChanges, UniqueAttribute, User, UserId};

/// Deadline applied when callers do not supply one.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time settings for [`UsersUpdater`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsersUpdaterConfig {
    default_timeout: Duration,
}

impl UsersUpdaterConfig {
    /// Settings with the given default deadline.
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Deadline applied by [`UsersUpdater::update`].
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

impl Default for UsersUpdaterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_TIMEOUT)
    }
}

/// Outcome of a rejected identity update.
///
/// The stored record is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserUpdateError {
    /// The current graffiti already has main-chain blocks.
    #[error("graffiti '{graffiti}' has {main_chain_entries} main-chain blocks and cannot change")]
    GraffitiLocked {
        graffiti: String,
        main_chain_entries: u64,
    },
    /// Another user already holds the requested value.
    #[error("{field} is already taken by another user")]
    DuplicateAttribute { field: UniqueAttribute },
    /// The store or ledger could not be reached.
    #[error("user store unavailable: {message}")]
    StoreUnavailable { message: String },
    /// The caller's deadline passed before the write was committed.
    #[error("identity update exceeded its deadline")]
    DeadlineExceeded,
    /// The user snapshot no longer matches a stored record.
    #[error("user {user_id} not found")]
    UserNotFound { user_id: String },
    /// The store rejected the update for a reason callers cannot fix.
    #[error("identity update failed: {message}")]
    Persistence { message: String },
}

impl UserUpdateError {
    /// Attribute responsible for the rejection, when there is one.
    pub fn field(&self) -> Option<UniqueAttribute> {
        match self {
            Self::GraffitiLocked { .. } => Some(UniqueAttribute::Graffiti),
            Self::DuplicateAttribute { field } => Some(*field),
            _ => None,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::DeadlineExceeded)
    }

    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GraffitiLocked { .. } => "graffiti_locked",
            Self::DuplicateAttribute { .. } => "duplicate_attribute",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::UserNotFound { .. } => "user_not_found",
            Self::Persistence { .. } => "persistence_error",
        }
    }
}

impl From<UserUpdateError> for Error {
    fn from(value: UserUpdateError) -> Self {
        let message = value.to_string();
        let code = value.code();
        match value {
            UserUpdateError::GraffitiLocked { .. } | UserUpdateError::DuplicateAttribute { .. } => {
                let field = value.field().map(UniqueAttribute::field_name);
                Error::unprocessable_entity(message)
                    .with_details(json!({ "field": field, "code": code }))
            }
            UserUpdateError::StoreUnavailable { .. } | UserUpdateError::DeadlineExceeded => {
                Error::service_unavailable(message).with_details(json!({ "code": code }))
            }
            UserUpdateError::UserNotFound { .. } => Error::not_found(message),
            UserUpdateError::Persistence { .. } => Error::internal(message),
        }
    }
}

fn map_store_error(error: UserIdentityStoreError) -> UserUpdateError {
    match error {
        UserIdentityStoreError::Connection { message } => {
            UserUpdateError::StoreUnavailable { message }
        }
        UserIdentityStoreError::Query { message } => UserUpdateError::Persistence { message },
        UserIdentityStoreError::NotFound { user_id } => UserUpdateError::UserNotFound { user_id },
        UserIdentityStoreError::UniqueViolation {
            attribute: Some(field),
            ..
        } => UserUpdateError::DuplicateAttribute { field },
        UserIdentityStoreError::UniqueViolation {
            attribute: None,
            constraint,
        } => UserUpdateError::Persistence {
            message: format!("unique constraint {constraint} violated"),
        },
    }
}

fn map_ledger_error(error: LedgerQueryError) -> UserUpdateError {
    match error {
        LedgerQueryError::Connection { message } => UserUpdateError::StoreUnavailable {
            message: format!("ledger unavailable: {message}"),
        },
        LedgerQueryError::Query { message } => UserUpdateError::Persistence {
            message: format!("ledger query failed: {message}"),
        },
    }
}

/// Failure raised while the transaction is still open.
enum ApplyFailure {
    Rejected(UserUpdateError),
    /// The store could not name the attribute behind a uniqueness violation.
    UnclassifiedConflict { constraint: String },
}

impl From<UserUpdateError> for ApplyFailure {
    fn from(value: UserUpdateError) -> Self {
        Self::Rejected(value)
    }
}

impl From<UserIdentityStoreError> for ApplyFailure {
    fn from(value: UserIdentityStoreError) -> Self {
        match value {
            UserIdentityStoreError::UniqueViolation {
                attribute: None,
                constraint,
            } => Self::UnclassifiedConflict { constraint },
            other => Self::Rejected(map_store_error(other)),
        }
    }
}

/// Coordinates identity updates against the user store and the ledger.
pub struct UsersUpdater<S, L> {
    store: Arc<S>,
    ledger: Arc<L>,
    config: UsersUpdaterConfig,
}

impl<S, L> Clone for UsersUpdater<S, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            config: self.config,
        }
    }
}

impl<S, L> UsersUpdater<S, L> {
    /// Create a coordinator over the given collaborators.
    pub fn new(store: Arc<S>, ledger: Arc<L>, config: UsersUpdaterConfig) -> Self {
        Self {
            store,
            ledger,
            config,
        }
    }
}

impl<S, L> UsersUpdater<S, L>
where
    S: UserIdentityStore,
    L: LedgerQuery,
{
    /// Apply `changes` to `user` within the configured default deadline.
    ///
    /// `user` is the caller's snapshot; its graffiti is the one checked for
    /// main-chain activity.
    ///
    /// # Errors
    ///
    /// See [`UserUpdateError`]; every error leaves the stored record intact.
    pub async fn update(
        &self,
        user: &User,
        changes: IdentityChanges,
    ) -> Result<User, UserUpdateError> {
        let deadline = Instant::now() + self.config.default_timeout();
        self.update_with_deadline(user, changes, deadline).await
    }

    /// Apply `changes` to `user`, giving up at `deadline`.
    ///
    /// Opening the transaction, the ledger check and the write all run under
    /// the deadline. If it passes first the transaction is rolled back and
    /// [`UserUpdateError::DeadlineExceeded`] is returned. A commit that has
    /// already started is allowed to finish.
    ///
    /// # Errors
    ///
    /// See [`UserUpdateError`]; every error leaves the stored record intact.
    pub async fn update_with_deadline(
        &self,
        user: &User,
        changes: IdentityChanges,
        deadline: Instant,
    ) -> Result<User, UserUpdateError> {
        debug!(
            user_id = %user.id(),
            requested = ?changes.requested().map(|(field, _)| field).collect::<Vec<_>>(),
            "applying identity update"
        );

        let mut transaction = timeout_at(deadline, self.store.begin())
            .await
            .map_err(|_| UserUpdateError::DeadlineExceeded)?
            .map_err(map_store_error)?;

        let applied = timeout_at(deadline, self.apply(transaction.as_mut(), user, &changes)).await;

        let failure = match applied {
            Ok(Ok(updated)) => {
                return match transaction.commit().await {
                    Ok(()) => {
                        info!(user_id = %user.id(), "identity updated");
                        Ok(updated)
                    }
                    Err(error) => Err(self
                        .resolve_failure(user, &changes, error.into(), deadline)
                        .await),
                };
            }
            Ok(Err(failure)) => failure,
            Err(_) => ApplyFailure::Rejected(UserUpdateError::DeadlineExceeded),
        };

        Self::roll_back(transaction, user.id()).await;
        Err(self.resolve_failure(user, &changes, failure, deadline).await)
    }

    async fn apply(
        &self,
        transaction: &mut dyn UserIdentityTransaction,
        user: &User,
        changes: &IdentityChanges,
    ) -> Result<User, ApplyFailure> {
        self.ensure_graffiti_unlocked(user, changes).await?;
        Self::ensure_handles_available(transaction, user, changes).await?;
        Ok(transaction.update_identity(user.id(), changes).await?)
    }

    async fn ensure_graffiti_unlocked(
        &self,
        user: &User,
        changes: &IdentityChanges,
    ) -> Result<(), UserUpdateError> {
        let Some(proposed) = changes.get(UniqueAttribute::Graffiti) else {
            return Ok(());
        };
        // A user without graffiti cannot have blocks attributed to them.
        let Some(current) = user.graffiti() else {
            return Ok(());
        };
        if current == proposed {
            return Ok(());
        }

        let main_chain_entries = self
            .ledger
            .count_main_chain_entries_by_handle(current)
            .await
            .map_err(map_ledger_error)?;
        if main_chain_entries > 0 {
            debug!(
                user_id = %user.id(),
                main_chain_entries,
                "graffiti change rejected by ledger activity"
            );
            return Err(UserUpdateError::GraffitiLocked {
                graffiti: current.to_owned(),
                main_chain_entries,
            });
        }
        Ok(())
    }

    async fn ensure_handles_available(
        transaction: &mut dyn UserIdentityTransaction,
        user: &User,
        changes: &IdentityChanges,
    ) -> Result<(), ApplyFailure> {
        for (field, value) in changes.requested() {
            if user.handle(field) == Some(value) {
                continue;
            }
            let holder = transaction.find_holder(field, value).await?;
            if holder.is_some_and(|holder| &holder != user.id()) {
                debug!(user_id = %user.id(), %field, "requested handle already held");
                return Err(UserUpdateError::DuplicateAttribute { field }.into());
            }
        }
        Ok(())
    }

    async fn resolve_failure(
        &self,
        user: &User,
        changes: &IdentityChanges,
        failure: ApplyFailure,
        deadline: Instant,
    ) -> UserUpdateError {
        match failure {
            ApplyFailure::Rejected(error) => error,
            ApplyFailure::UnclassifiedConflict { constraint } => timeout_at(
                deadline,
                self.attribute_conflict(user, changes, &constraint),
            )
            .await
            .unwrap_or(UserUpdateError::DeadlineExceeded),
        }
    }

    /// Attribute a uniqueness violation the store could not classify by
    /// looking up committed holders of each requested value.
    async fn attribute_conflict(
        &self,
        user: &User,
        changes: &IdentityChanges,
        constraint: &str,
    ) -> UserUpdateError {
        let requested: Vec<_> = changes.requested().collect();
        for &(field, value) in &requested {
            match self.store.find_holder(field, value).await {
                Ok(Some(holder)) if &holder != user.id() => {
                    return UserUpdateError::DuplicateAttribute { field };
                }
                Ok(_) => {}
                Err(error) => return map_store_error(error),
            }
        }

        // The racing holder may have released the value again; a single
        // requested attribute can still only be the one that collided.
        if let [(field, _)] = requested.as_slice() {
            return UserUpdateError::DuplicateAttribute { field: *field };
        }
        warn!(
            user_id = %user.id(),
            constraint,
            "unique violation could not be attributed to a field"
        );
        UserUpdateError::Persistence {
            message: format!("unique constraint {constraint} violated"),
        }
    }

    async fn roll_back(transaction: Box<dyn UserIdentityTransaction>, user_id: &UserId) {
        if let Err(error) = transaction.rollback().await {
            warn!(%user_id, %error, "identity update rollback failed");
        }
    }
}

#[cfg(test)]
#[path = "users_updater_tests.rs"]
mod tests;
