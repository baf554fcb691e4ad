//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed identity store and ledger query using
//!   Diesel ORM.
//! - **memory**: in-process identity store with the same uniqueness and
//!   transaction guarantees, for tests and local runs.
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
