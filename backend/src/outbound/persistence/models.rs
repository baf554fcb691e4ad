//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; adapters convert them into
//! domain values before returning.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{IdentityChanges, UniqueAttribute, User, UserId};

use super::schema::users;

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub graffiti: Option<String>,
    pub discord: Option<String>,
    pub telegram: Option<String>,
    pub country_code: String,
    pub total_points: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let total_points = u64::try_from(row.total_points).unwrap_or_else(|_| {
            warn!(
                user_id = %row.id,
                total_points = row.total_points,
                "negative total_points in users row; reporting zero"
            );
            0
        });
        let mut builder = User::builder(UserId::from_uuid(row.id), row.email)
            .country_code(row.country_code)
            .total_points(total_points);
        if let Some(graffiti) = row.graffiti {
            builder = builder.graffiti(graffiti);
        }
        if let Some(discord) = row.discord {
            builder = builder.discord(discord);
        }
        if let Some(telegram) = row.telegram {
            builder = builder.telegram(telegram);
        }
        builder.build()
    }
}

/// Changeset for the requested identity handles.
///
/// `None` fields are skipped by Diesel, so unrequested handles keep their
/// stored value. `updated_at` is always set, which keeps the changeset
/// non-empty even when nothing was requested.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct IdentityChangeset<'a> {
    pub graffiti: Option<&'a str>,
    pub discord: Option<&'a str>,
    pub telegram: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> IdentityChangeset<'a> {
    pub fn new(changes: &'a IdentityChanges, updated_at: DateTime<Utc>) -> Self {
        Self {
            graffiti: changes.get(UniqueAttribute::Graffiti),
            discord: changes.get(UniqueAttribute::Discord),
            telegram: changes.get(UniqueAttribute::Telegram),
            updated_at,
        }
    }
}
