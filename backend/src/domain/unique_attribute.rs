//! Identity attributes guarded by store-level uniqueness constraints.
//!
//! [`UniqueAttribute`] is the fixed enumeration that conflict errors carry,
//! so callers receive a field name rather than a storage-specific constraint
//! identifier. [`UniqueConstraintMap`] translates constraint identifiers
//! reported by a store back into attributes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// User attribute that must be unique across all user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UniqueAttribute {
    /// Display handle attributed to mined blocks.
    Graffiti,
    /// Linked Discord handle.
    #[serde(rename = "discordHandle")]
    Discord,
    /// Linked Telegram handle.
    #[serde(rename = "telegramHandle")]
    Telegram,
}

impl UniqueAttribute {
    /// Every attribute, in the order changes are checked.
    pub const ALL: [Self; 3] = [Self::Graffiti, Self::Discord, Self::Telegram];

    /// Stable field name reported to API consumers.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Graffiti => "graffiti",
            Self::Discord => "discordHandle",
            Self::Telegram => "telegramHandle",
        }
    }

    /// Name of the unique index created by the bundled migrations.
    pub const fn default_constraint_name(self) -> &'static str {
        match self {
            Self::Graffiti => "uq_users_on_graffiti",
            Self::Discord => "uq_users_on_discord",
            Self::Telegram => "uq_users_on_telegram",
        }
    }
}

impl fmt::Display for UniqueAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Lookup from store constraint identifiers to the attribute they protect.
///
/// Built once at startup and handed to store adapters so classification
/// never depends on ambient state.
///
/// # Examples
/// ```
/// use backend::domain::{UniqueAttribute, UniqueConstraintMap};
///
/// let map = UniqueConstraintMap::postgres_default();
/// assert_eq!(
///     map.classify(Some("uq_users_on_discord"), ""),
///     Some(UniqueAttribute::Discord)
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueConstraintMap {
    constraints: HashMap<String, UniqueAttribute>,
}

impl UniqueConstraintMap {
    /// Empty map; every violation is left unclassified.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Map covering the unique indexes created by the bundled migrations.
    pub fn postgres_default() -> Self {
        UniqueAttribute::ALL
            .into_iter()
            .fold(Self::empty(), |map, attribute| {
                map.with_constraint(attribute.default_constraint_name(), attribute)
            })
    }

    /// Register an additional constraint identifier.
    #[must_use]
    pub fn with_constraint(
        mut self,
        constraint: impl Into<String>,
        attribute: UniqueAttribute,
    ) -> Self {
        self.constraints.insert(constraint.into(), attribute);
        self
    }

    /// Attribute registered for an exact constraint identifier.
    pub fn attribute_for(&self, constraint: &str) -> Option<UniqueAttribute> {
        self.constraints.get(constraint).copied()
    }

    /// Classify a violation from the reported constraint name, falling back to
    /// a known constraint identifier quoted in the error message.
    pub fn classify(&self, constraint: Option<&str>, message: &str) -> Option<UniqueAttribute> {
        if let Some(attribute) = constraint.and_then(|name| self.attribute_for(name)) {
            return Some(attribute);
        }

        self.constraints
            .iter()
            .filter(|(name, _)| message.contains(name.as_str()))
            // Longest match wins so overlapping names resolve deterministically.
            .max_by_key(|(name, _)| name.len())
            .map(|(_, attribute)| *attribute)
    }
}
