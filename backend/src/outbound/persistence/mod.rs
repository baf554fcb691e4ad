//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the identity store and ledger ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` connection pool.
//!
//! - **Thin adapters**: adapters translate between Diesel rows and domain
//!   types; no business rules live here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Classified errors**: Diesel failures become port errors, with unique
//!   violations tagged by the attribute they protect.
//!
//! # Example
//!
//! ```no_run
//! use backend::outbound::persistence::{
//!     DbPool, DieselLedgerQuery, DieselUserIdentityStore, PoolConfig,
//! };
//!
//! # async fn wire() -> Result<(), backend::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/testnet")).await?;
//! let store = DieselUserIdentityStore::new(pool.clone());
//! let ledger = DieselLedgerQuery::new(pool, 1);
//! # let _ = (store, ledger);
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_ledger_query;
mod diesel_user_identity_store;
mod models;
mod pool;
mod schema;

pub use diesel_ledger_query::DieselLedgerQuery;
pub use diesel_user_identity_store::DieselUserIdentityStore;
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
