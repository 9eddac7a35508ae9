use uuid::Uuid;

use passage_domain::account::AccountRole;
use passage_domain::profile::GrantType;
use passage_events::events::ProfileCreatedEvent;
use passage_identity::domain::keys::{forgot_key, pending_profile_key};
use passage_identity::domain::repository::{CredentialStore, ExpiryHandler};
use passage_identity::error::IdentityError;
use passage_identity::usecase::login::LoginInput;
use passage_identity::usecase::profile::AttachProfileInput;
use passage_identity::usecase::saga::{Confirmation, Expiry};
use passage_identity::usecase::signup::SignUpInput;

use crate::helpers::{Harness, PASSWORD, PENDING_TTL};

fn confirmation(auth_id: Uuid, profile_id: Uuid) -> ProfileCreatedEvent {
    ProfileCreatedEvent {
        profile_id,
        auth_id,
        role: "client".to_owned(),
    }
}

async fn signed_up(h: &Harness) -> (Uuid, Uuid) {
    h.sign_up()
        .execute(SignUpInput {
            email: "a@x.com".to_owned(),
            password: PASSWORD.to_owned(),
            role: 0,
        })
        .await
        .unwrap();
    let account = h.accounts.all()[0].clone();
    let profile = h.profiles.of(account.id)[0].clone();
    (account.id, profile.id)
}

// ── confirm ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_activate_account_on_first_confirmation() {
    let h = Harness::new();
    let (account_id, profile_id) = signed_up(&h).await;

    let outcome = h
        .saga()
        .confirm(&confirmation(account_id, profile_id))
        .await
        .unwrap();

    assert_eq!(outcome, Confirmation::Activated);
    assert!(h.accounts.get(account_id).unwrap().is_active);
    assert!(h.store.value(&pending_profile_key(profile_id)).is_none());
}

#[tokio::test]
async fn should_treat_replayed_confirmation_as_settled() {
    let h = Harness::new();
    let (account_id, profile_id) = signed_up(&h).await;
    let saga = h.saga();
    let event = confirmation(account_id, profile_id);

    let first = saga.confirm(&event).await.unwrap();
    let second = saga.confirm(&event).await.unwrap();

    assert_eq!(first, Confirmation::Activated);
    assert_eq!(second, Confirmation::AlreadySettled);
    assert!(h.accounts.get(account_id).unwrap().is_active);
}

#[tokio::test]
async fn should_confirm_additional_profile_of_active_account() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    h.seed_profile(account.id, GrantType::Main);
    let sub = h.seed_profile(account.id, GrantType::Sub);
    h.store
        .put(&pending_profile_key(sub.id), "1", PENDING_TTL)
        .await
        .unwrap();

    let outcome = h
        .saga()
        .confirm(&confirmation(account.id, sub.id))
        .await
        .unwrap();
    assert_eq!(outcome, Confirmation::Activated);
}

#[tokio::test]
async fn should_flag_inactive_account_with_several_profiles() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, false);
    h.seed_profile(account.id, GrantType::Main);
    let sub = h.seed_profile(account.id, GrantType::Sub);
    h.store
        .put(&pending_profile_key(sub.id), "1", PENDING_TTL)
        .await
        .unwrap();

    let result = h.saga().confirm(&confirmation(account.id, sub.id)).await;
    assert!(
        matches!(result, Err(IdentityError::FaultedAccount)),
        "expected FaultedAccount, got {result:?}"
    );
    assert!(h.store.value(&pending_profile_key(sub.id)).is_some());
    assert!(!h.accounts.get(account.id).unwrap().is_active);
}

#[tokio::test]
async fn should_reject_confirmation_for_unknown_account() {
    let h = Harness::new();

    let result = h
        .saga()
        .confirm(&confirmation(Uuid::new_v4(), Uuid::new_v4()))
        .await;
    assert!(
        matches!(result, Err(IdentityError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_confirmation_for_removed_profile() {
    let h = Harness::new();
    let (account_id, _) = signed_up(&h).await;

    let result = h
        .saga()
        .confirm(&confirmation(account_id, Uuid::new_v4()))
        .await;
    assert!(
        matches!(result, Err(IdentityError::AccessRevoked)),
        "expected AccessRevoked, got {result:?}"
    );
}

// ── expire ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_remove_profile_whose_marker_expired() {
    let h = Harness::new();
    let (account_id, profile_id) = signed_up(&h).await;
    let saga = h.saga();

    let expired = h.store.expire_pending();
    assert_eq!(expired, vec![pending_profile_key(profile_id)]);
    for key in &expired {
        saga.on_key_expired(key).await.unwrap();
    }

    assert!(h.profiles.of(account_id).is_empty());
    assert_eq!(h.profiles.deleted(), vec![profile_id]);
}

#[tokio::test]
async fn should_spare_confirmed_profile_when_markers_expire() {
    let h = Harness::new();
    let (account_id, profile_id) = signed_up(&h).await;
    let saga = h.saga();
    saga.confirm(&confirmation(account_id, profile_id))
        .await
        .unwrap();

    for key in h.store.expire_pending() {
        saga.on_key_expired(&key).await.unwrap();
    }

    assert_eq!(h.profiles.of(account_id).len(), 1);
    assert!(h.profiles.deleted().is_empty());
}

#[tokio::test]
async fn should_settle_confirmation_arriving_after_expiry() {
    let h = Harness::new();
    let (account_id, profile_id) = signed_up(&h).await;
    let saga = h.saga();
    h.store.expire_pending();

    let outcome = saga
        .confirm(&confirmation(account_id, profile_id))
        .await
        .unwrap();
    assert_eq!(outcome, Confirmation::AlreadySettled);
    assert!(!h.accounts.get(account_id).unwrap().is_active);
}

#[tokio::test]
async fn should_ignore_unrelated_expired_keys() {
    let h = Harness::new();
    let saga = h.saga();

    let outcome = saga.expire(&forgot_key(Uuid::new_v4())).await.unwrap();
    assert_eq!(outcome, Expiry::Ignored);
    let outcome = saga.expire("profile:pending:not-a-uuid").await.unwrap();
    assert_eq!(outcome, Expiry::Ignored);
}

#[tokio::test]
async fn should_report_already_gone_on_repeated_expiry() {
    let h = Harness::new();
    let (_, profile_id) = signed_up(&h).await;
    let saga = h.saga();
    let key = pending_profile_key(profile_id);

    assert_eq!(saga.expire(&key).await.unwrap(), Expiry::Removed);
    assert_eq!(saga.expire(&key).await.unwrap(), Expiry::AlreadyGone);
}

#[tokio::test]
async fn should_restore_previous_main_when_new_main_expires() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    let old_main = h.seed_profile(account.id, GrantType::Main);
    h.attach()
        .execute(AttachProfileInput {
            account_id: account.id,
            grant_type: 0,
        })
        .await
        .unwrap();
    let saga = h.saga();

    for key in h.store.expire_pending() {
        assert_eq!(saga.expire(&key).await.unwrap(), Expiry::Removed);
    }

    let profiles = h.profiles.of(account.id);
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, old_main.id);
    assert_eq!(profiles[0].grant_type, GrantType::Main);

    let login = h
        .login()
        .execute(LoginInput {
            email: "a@x.com".to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await;
    assert!(login.is_ok(), "expected login to succeed, got {login:?}");
}

#[tokio::test]
async fn should_keep_main_when_expired_profile_was_sub() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    let main = h.seed_profile(account.id, GrantType::Main);
    let older_sub = h.seed_profile(account.id, GrantType::Sub);
    let pending = h.seed_profile(account.id, GrantType::Sub);

    let outcome = h
        .saga()
        .expire(&pending_profile_key(pending.id))
        .await
        .unwrap();

    assert_eq!(outcome, Expiry::Removed);
    assert_eq!(h.profiles.of(account.id), vec![main, older_sub]);
}
