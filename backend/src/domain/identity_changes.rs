//! Partial change set for a user's unique identity attributes.

use serde::{Deserialize, Serialize};

use super::unique_attribute::UniqueAttribute;

/// Proposed new values for a user's unique attributes.
///
/// Empty or whitespace-only values mean "not requested" and are dropped on
/// construction, so no uniqueness or immutability check ever runs for them.
///
/// # Examples
/// ```
/// use backend::domain::{IdentityChanges, UniqueAttribute};
///
/// let changes = IdentityChanges::new().graffiti("g3").discord("");
/// let requested: Vec<_> = changes.requested().collect();
/// assert_eq!(requested, vec![(UniqueAttribute::Graffiti, "g3")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "IdentityChangesPayload")]
pub struct IdentityChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    graffiti: Option<String>,
    #[serde(rename = "discordHandle", skip_serializing_if = "Option::is_none")]
    discord: Option<String>,
    #[serde(rename = "telegramHandle", skip_serializing_if = "Option::is_none")]
    telegram: Option<String>,
}

/// Wire shape of [`IdentityChanges`] before blank values are dropped.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityChangesPayload {
    #[serde(default)]
    graffiti: Option<String>,
    #[serde(default, rename = "discordHandle", alias = "discord")]
    discord: Option<String>,
    #[serde(default, rename = "telegramHandle", alias = "telegram")]
    telegram: Option<String>,
}

impl From<IdentityChangesPayload> for IdentityChanges {
    fn from(payload: IdentityChangesPayload) -> Self {
        Self::from_parts(payload.graffiti, payload.discord, payload.telegram)
    }
}

fn requested_value(value: Option<String>) -> Option<String> {
    value.filter(|candidate| !candidate.trim().is_empty())
}

impl IdentityChanges {
    /// Empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from optional raw inputs, dropping empty values.
    pub fn from_parts(
        graffiti: Option<String>,
        discord: Option<String>,
        telegram: Option<String>,
    ) -> Self {
        Self {
            graffiti: requested_value(graffiti),
            discord: requested_value(discord),
            telegram: requested_value(telegram),
        }
    }

    /// Request a new graffiti.
    #[must_use]
    pub fn graffiti(self, graffiti: impl Into<String>) -> Self {
        self.with(UniqueAttribute::Graffiti, graffiti)
    }

    /// Request a new Discord handle.
    #[must_use]
    pub fn discord(self, discord: impl Into<String>) -> Self {
        self.with(UniqueAttribute::Discord, discord)
    }

    /// Request a new Telegram handle.
    #[must_use]
    pub fn telegram(self, telegram: impl Into<String>) -> Self {
        self.with(UniqueAttribute::Telegram, telegram)
    }

    /// Request a new value for `attribute`.
    #[must_use]
    pub fn with(mut self, attribute: UniqueAttribute, value: impl Into<String>) -> Self {
        let value = requested_value(Some(value.into()));
        match attribute {
            UniqueAttribute::Graffiti => self.graffiti = value,
            UniqueAttribute::Discord => self.discord = value,
            UniqueAttribute::Telegram => self.telegram = value,
        }
        self
    }

    /// Requested value for a single attribute.
    pub fn get(&self, attribute: UniqueAttribute) -> Option<&str> {
        match attribute {
            UniqueAttribute::Graffiti => self.graffiti.as_deref(),
            UniqueAttribute::Discord => self.discord.as_deref(),
            UniqueAttribute::Telegram => self.telegram.as_deref(),
        }
    }

    /// Requested attributes paired with their proposed values.
    pub fn requested(&self) -> impl Iterator<Item = (UniqueAttribute, &str)> + '_ {
        UniqueAttribute::ALL
            .into_iter()
            .filter_map(move |attribute| self.get(attribute).map(|value| (attribute, value)))
    }

    /// Whether nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.requested().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_values_are_not_requested(#[case] blank: &str) {
        let changes = IdentityChanges::new()
            .graffiti(blank)
            .discord(blank)
            .telegram(blank);

        assert!(changes.is_empty());
    }

    #[rstest]
    fn requested_preserves_check_order() {
        let changes = IdentityChanges::new()
            .telegram("t3")
            .graffiti("g3")
            .discord("d3");

        let requested: Vec<_> = changes.requested().collect();
        assert_eq!(
            requested,
            vec![
                (UniqueAttribute::Graffiti, "g3"),
                (UniqueAttribute::Discord, "d3"),
                (UniqueAttribute::Telegram, "t3"),
            ]
        );
    }

    #[rstest]
    fn blank_value_clears_an_earlier_request() {
        let changes = IdentityChanges::new().discord("alice").discord("");
        assert_eq!(changes.get(UniqueAttribute::Discord), None);
    }

    #[rstest]
    fn deserialised_payloads_accept_both_field_spellings() {
        let changes: IdentityChanges = serde_json::from_str(
            r#"{"graffiti":"","discord":"alice","telegramHandle":"bob"}"#,
        )
        .expect("payload deserialises");

        assert_eq!(changes.get(UniqueAttribute::Graffiti), None);
        assert_eq!(changes.get(UniqueAttribute::Discord), Some("alice"));
        assert_eq!(changes.get(UniqueAttribute::Telegram), Some("bob"));
    }

    #[rstest]
    #[case(r#"{"discordHandle":""}"#)]
    #[case(r#"{"graffiti":"  ","telegram":""}"#)]
    fn deserialised_blanks_are_not_requested(#[case] payload: &str) {
        let changes: IdentityChanges =
            serde_json::from_str(payload).expect("payload deserialises");

        assert!(changes.is_empty());
        assert_eq!(changes, IdentityChanges::new());
    }
}
