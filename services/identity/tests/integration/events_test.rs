use serde_json::json;
use uuid::Uuid;

use passage_domain::account::AccountRole;
use passage_domain::chat::ChatRole;
use passage_events::EventEnvelope;
use passage_events::events::{GroupCreatedEvent, ProfileCreatedEvent, UserCreatedEvent};
use passage_identity::domain::repository::InboundHandler;
use passage_identity::error::IdentityError;
use passage_identity::usecase::signup::SignUpInput;

use crate::helpers::{Harness, PASSWORD};

const PROFILE_SOURCE: &str = "profile_events";

#[tokio::test]
async fn should_route_profile_created_to_confirmation() {
    let h = Harness::new();
    h.sign_up()
        .execute(SignUpInput {
            email: "a@x.com".to_owned(),
            password: PASSWORD.to_owned(),
            role: 1,
        })
        .await
        .unwrap();
    let account = h.accounts.all()[0].clone();
    let profile = h.profiles.of(account.id)[0].clone();
    let envelope = EventEnvelope::wrap(
        &ProfileCreatedEvent {
            profile_id: profile.id,
            auth_id: account.id,
            role: "organization".to_owned(),
        },
        PROFILE_SOURCE,
    )
    .unwrap();

    let dispatcher = h.dispatcher();
    dispatcher.handle(&envelope).await.unwrap();
    dispatcher.handle(&envelope).await.unwrap();

    assert!(h.accounts.get(account.id).unwrap().is_active);
}

#[tokio::test]
async fn should_route_group_created_to_membership() {
    let h = Harness::new();
    let creator = h.seed_account("a@x.com", AccountRole::Client, true);
    let group_id = Uuid::new_v4();
    let envelope = EventEnvelope::wrap(
        &GroupCreatedEvent {
            group_id,
            creator_id: creator.id,
        },
        "group_events",
    )
    .unwrap();

    h.dispatcher().handle(&envelope).await.unwrap();

    let members = h.members.all();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, ChatRole::Admin);
}

#[tokio::test]
async fn should_skip_events_without_handler() {
    let h = Harness::new();
    let envelope = EventEnvelope::wrap(
        &UserCreatedEvent {
            auth_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            email: "a@x.com".to_owned(),
            role: "client".to_owned(),
        },
        "auth_events",
    )
    .unwrap();

    h.dispatcher().handle(&envelope).await.unwrap();
    assert!(h.members.all().is_empty());
}

#[tokio::test]
async fn should_drop_undecodable_payload() {
    let h = Harness::new();
    let mut envelope = EventEnvelope::wrap(
        &GroupCreatedEvent {
            group_id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
        },
        "group_events",
    )
    .unwrap();
    envelope.payload = json!({ "group_id": "not-a-uuid" });

    h.dispatcher().handle(&envelope).await.unwrap();
    assert!(h.members.all().is_empty());
}

#[tokio::test]
async fn should_propagate_handler_rejection() {
    let h = Harness::new();
    let envelope = EventEnvelope::wrap(
        &GroupCreatedEvent {
            group_id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
        },
        "group_events",
    )
    .unwrap();

    let result = h.dispatcher().handle(&envelope).await;
    assert!(
        matches!(result, Err(IdentityError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}
