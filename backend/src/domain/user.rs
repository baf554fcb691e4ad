//! User identity record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity_changes::IdentityChanges;
use super::unique_attribute::UniqueAttribute;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned user identifier stored as a UUID.
///
/// Equality and hashing use the UUID only, so differently cased spellings of
/// one identifier compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl PartialEq for UserId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for UserId {}

impl std::hash::Hash for UserId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an identifier already issued by a store.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id, id.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Participant in the points program.
///
/// ## Invariants
/// - `id` is assigned by the store and never changes.
/// - `graffiti`, `discord` and `telegram` are unique across users when
///   present; the store enforces this, not the type.
/// - `total_points` is owned by reward logic and is carried through identity
///   updates untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: String,
    graffiti: Option<String>,
    #[serde(rename = "discordHandle", alias = "discord")]
    discord: Option<String>,
    #[serde(rename = "telegramHandle", alias = "telegram")]
    telegram: Option<String>,
    country_code: String,
    total_points: u64,
}

impl User {
    /// Start building a user with the required identity fields.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{User, UserId};
    ///
    /// let user = User::builder(UserId::random(), "ada@example.com")
    ///     .graffiti("ada")
    ///     .country_code("GBR")
    ///     .build();
    /// assert_eq!(user.graffiti(), Some("ada"));
    /// assert_eq!(user.total_points(), 0);
    /// ```
    pub fn builder(id: UserId, email: impl Into<String>) -> UserBuilder {
        UserBuilder {
            user: Self {
                id,
                email: email.into(),
                graffiti: None,
                discord: None,
                telegram: None,
                country_code: String::new(),
                total_points: 0,
            },
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Contact email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Handle attributed to mined blocks, once chosen.
    pub fn graffiti(&self) -> Option<&str> {
        self.graffiti.as_deref()
    }

    /// Linked Discord handle.
    pub fn discord(&self) -> Option<&str> {
        self.discord.as_deref()
    }

    /// Linked Telegram handle.
    pub fn telegram(&self) -> Option<&str> {
        self.telegram.as_deref()
    }

    /// ISO 3166-1 alpha-3 country code.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Points accrued through the rewards program.
    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    /// Current value of a unique attribute.
    pub fn handle(&self, attribute: UniqueAttribute) -> Option<&str> {
        match attribute {
            UniqueAttribute::Graffiti => self.graffiti(),
            UniqueAttribute::Discord => self.discord(),
            UniqueAttribute::Telegram => self.telegram(),
        }
    }

    /// Copy of this user with the requested identity changes merged in.
    ///
    /// Attributes absent from `changes` keep their current value.
    #[must_use]
    pub fn with_identity(&self, changes: &IdentityChanges) -> Self {
        let mut merged = self.clone();
        for (attribute, value) in changes.requested() {
            let slot = match attribute {
                UniqueAttribute::Graffiti => &mut merged.graffiti,
                UniqueAttribute::Discord => &mut merged.discord,
                UniqueAttribute::Telegram => &mut merged.telegram,
            };
            *slot = Some(value.to_owned());
        }
        merged
    }
}

/// Builder for [`User`] records.
#[derive(Debug, Clone)]
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    /// Set the graffiti handle.
    #[must_use]
    pub fn graffiti(mut self, graffiti: impl Into<String>) -> Self {
        self.user.graffiti = Some(graffiti.into());
        self
    }

    /// Set the Discord handle.
    #[must_use]
    pub fn discord(mut self, discord: impl Into<String>) -> Self {
        self.user.discord = Some(discord.into());
        self
    }

    /// Set the Telegram handle.
    #[must_use]
    pub fn telegram(mut self, telegram: impl Into<String>) -> Self {
        self.user.telegram = Some(telegram.into());
        self
    }

    /// Set the country code.
    #[must_use]
    pub fn country_code(mut self, country_code: impl Into<String>) -> Self {
        self.user.country_code = country_code.into();
        self
    }

    /// Set the accrued points.
    #[must_use]
    pub fn total_points(mut self, total_points: u64) -> Self {
        self.user.total_points = total_points;
        self
    }

    /// Finish building.
    pub fn build(self) -> User {
        self.user
    }
}

#[cfg(test)]
mod tests;
