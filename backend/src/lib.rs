//! Identity update coordination for testnet participants.
//!
//! - [`domain`]: user identity types, the [`domain::UsersUpdater`]
//!   coordinator and the ports it drives.
//! - [`outbound`]: PostgreSQL and in-memory adapters for those ports.
//! - [`settings`]: layered configuration for wiring the coordinator.

pub mod domain;
pub mod outbound;
pub mod settings;
