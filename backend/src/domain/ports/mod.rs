//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod ledger_query;
mod user_identity_store;

#[cfg(test)]
pub use ledger_query::MockLedgerQuery;
pub use ledger_query::{FixtureLedgerQuery, LedgerQuery, LedgerQueryError};
pub use user_identity_store::{
    UserIdentityStore, UserIdentityStoreError, UserIdentityTransaction,
};
