//! Domain primitives, ports and the identity update coordinator.
//!
//! Purpose: Define strongly typed user identity entities and the rules that
//! govern changing them. Types are immutable; serde contracts and invariants
//! are documented on each type.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — caller-facing error payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - User (alias to `user::User`) — stored user record.
//! - IdentityChanges — requested graffiti/Discord/Telegram values.
//! - UniqueAttribute — the fixed set of mutually unique attributes.
//! - UsersUpdater — coordinator applying identity changes atomically.

pub mod error;
pub mod identity_changes;
pub mod ports;
pub mod unique_attribute;
pub mod user;
pub mod users_updater;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity_changes::IdentityChanges;
pub use self::unique_attribute::{UniqueAttribute, UniqueConstraintMap};
pub use self::user::{User, UserBuilder, UserId, UserValidationError};
pub use self::users_updater::{
    DEFAULT_UPDATE_TIMEOUT, UserUpdateError, UsersUpdater, UsersUpdaterConfig,
};
