//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered participants and their identity handles.
    ///
    /// `graffiti`, `discord` and `telegram` each carry a named unique index
    /// (`uq_users_on_<column>`); NULL values never conflict.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        graffiti -> Nullable<Varchar>,
        discord -> Nullable<Varchar>,
        telegram -> Nullable<Varchar>,
        country_code -> Varchar,
        total_points -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ingested ledger blocks. Read-only for this crate.
    blocks (id) {
        id -> Int8,
        hash -> Varchar,
        sequence -> Int8,
        graffiti -> Varchar,
        /// Whether the block is on the canonical chain.
        main -> Bool,
        network_version -> Int4,
        timestamp -> Timestamptz,
    }
}
