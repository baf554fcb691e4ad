//! Tests for the domain user model.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn user() -> User {
    User::builder(UserId::new(VALID_ID).expect("valid id"), "ada@example.com")
        .graffiti("g1")
        .discord("ada")
        .country_code("GBR")
        .total_points(42)
        .build()
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
fn user_id_round_trips_through_display() {
    let id = UserId::new(VALID_ID).expect("valid id");
    assert_eq!(id.to_string(), VALID_ID);
    assert_eq!(UserId::from_uuid(*id.as_uuid()), id);
}

#[rstest]
fn user_id_equality_ignores_spelling() {
    let lower = UserId::new(VALID_ID).expect("valid id");
    let upper = UserId::new(VALID_ID.to_uppercase()).expect("valid id");
    assert_eq!(lower, upper);
    assert_ne!(lower.to_string(), upper.to_string());
}

#[rstest]
fn handle_reads_each_unique_attribute(user: User) {
    assert_eq!(user.handle(UniqueAttribute::Graffiti), Some("g1"));
    assert_eq!(user.handle(UniqueAttribute::Discord), Some("ada"));
    assert_eq!(user.handle(UniqueAttribute::Telegram), None);
}

#[rstest]
fn with_identity_replaces_only_requested_attributes(user: User) {
    let merged = user.with_identity(&IdentityChanges::new().telegram("ada_tg"));

    assert_eq!(merged.graffiti(), Some("g1"));
    assert_eq!(merged.discord(), Some("ada"));
    assert_eq!(merged.telegram(), Some("ada_tg"));
    assert_eq!(merged.total_points(), 42);
    assert_eq!(merged.id(), user.id());
}

#[rstest]
fn with_identity_ignores_blank_requests(user: User) {
    let merged = user.with_identity(&IdentityChanges::new().graffiti("").discord("  "));
    assert_eq!(merged, user);
}

#[rstest]
fn serialises_with_api_field_names(user: User) {
    let value = serde_json::to_value(&user).expect("serialise user");
    assert_eq!(
        value,
        json!({
            "id": VALID_ID,
            "email": "ada@example.com",
            "graffiti": "g1",
            "discordHandle": "ada",
            "telegramHandle": null,
            "countryCode": "GBR",
            "totalPoints": 42,
        })
    );
}
