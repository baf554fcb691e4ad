//! PostgreSQL-backed `LedgerQuery` over the ingested `blocks` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LedgerQuery, LedgerQueryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::blocks;

/// Counts main-chain blocks for one network version.
///
/// Blocks from other network versions (for example a previous testnet
/// phase) are ignored, so a graffiti reused across phases starts unlocked.
#[derive(Clone)]
pub struct DieselLedgerQuery {
    pool: DbPool,
    network_version: i32,
}

impl DieselLedgerQuery {
    /// Create a ledger query scoped to `network_version`.
    pub fn new(pool: DbPool, network_version: i32) -> Self {
        Self {
            pool,
            network_version,
        }
    }
}

#[async_trait]
impl LedgerQuery for DieselLedgerQuery {
    async fn count_main_chain_entries_by_handle(
        &self,
        handle: &str,
    ) -> Result<u64, LedgerQueryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LedgerQueryError::connection))?;

        let count: i64 = blocks::table
            .filter(blocks::graffiti.eq(handle))
            .filter(blocks::main.eq(true))
            .filter(blocks::network_version.eq(self.network_version))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(err, LedgerQueryError::query, LedgerQueryError::connection)
            })?;

        u64::try_from(count).map_err(|_| LedgerQueryError::query("negative block count"))
    }
}
