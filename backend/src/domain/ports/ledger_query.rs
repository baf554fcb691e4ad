//! Port for read-only queries against the block ledger.
//!
//! The coordinator only needs one fact from the ledger: how many accepted
//! (main-chain) entries are attributed to a handle. Adapters must exclude
//! orphaned or side-branch entries and scope the count to the network they
//! were configured for.

use std::collections::HashMap;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger query adapters.
    pub enum LedgerQueryError {
        /// Ledger store connection could not be established.
        Connection { message: String } => "ledger connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "ledger query failed: {message}",
    }
}

/// Read access to main-chain ledger activity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Count main-chain entries attributed to `handle`.
    async fn count_main_chain_entries_by_handle(
        &self,
        handle: &str,
    ) -> Result<u64, LedgerQueryError>;
}

/// Fixture ledger returning preconfigured counts; unknown handles count zero.
#[derive(Debug, Default, Clone)]
pub struct FixtureLedgerQuery {
    counts: HashMap<String, u64>,
}

impl FixtureLedgerQuery {
    /// Record `count` main-chain entries for `handle`.
    #[must_use]
    pub fn with_entries(mut self, handle: impl Into<String>, count: u64) -> Self {
        self.counts.insert(handle.into(), count);
        self
    }
}

#[async_trait]
impl LedgerQuery for FixtureLedgerQuery {
    async fn count_main_chain_entries_by_handle(
        &self,
        handle: &str,
    ) -> Result<u64, LedgerQueryError> {
        Ok(self.counts.get(handle).copied().unwrap_or(0))
    }
}
