use passage_auth_types::TokenPurpose;
use passage_domain::account::AccountRole;
use passage_domain::password::PasswordRule;
use passage_domain::profile::GrantType;
use passage_events::Topic;
use passage_events::events::EmailQueueEvent;
use passage_identity::domain::keys::forgot_key;
use passage_identity::error::IdentityError;
use passage_identity::usecase::login::LoginInput;
use passage_identity::usecase::password::{
    FORGOT_PASSWORD_TEMPLATE, ForgotPasswordInput, ResetPasswordInput,
};

use crate::helpers::{FORGOT_TTL, Harness, PASSWORD};

const NEW_PASSWORD: &str = "Renewed9x";

fn sent_code(h: &Harness) -> String {
    let published = h.publisher.published();
    let (envelope, _) = published.last().unwrap();
    let email: EmailQueueEvent = serde_json::from_value(envelope.payload.clone()).unwrap();
    email.variables["code"].clone()
}

async fn forgot(h: &Harness, email: &str) {
    h.forgot()
        .execute(ForgotPasswordInput {
            email: email.to_owned(),
        })
        .await
        .unwrap();
}

fn reset_input(code: &str, password: &str) -> ResetPasswordInput {
    ResetPasswordInput {
        email: "a@x.com".to_owned(),
        code: code.to_owned(),
        password: password.to_owned(),
    }
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_queue_reset_email_and_store_code_digest() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);

    let message = h
        .forgot()
        .execute(ForgotPasswordInput {
            email: "a@x.com".to_owned(),
        })
        .await
        .unwrap();
    assert!(message.message.contains("sent an email"));

    let published = h.publisher.published();
    assert_eq!(published.len(), 1);
    let (envelope, topic) = &published[0];
    assert_eq!(*topic, Topic::MessagingEventsEmail);
    let email: EmailQueueEvent = serde_json::from_value(envelope.payload.clone()).unwrap();
    assert_eq!(email.recipient, "a@x.com");
    assert_eq!(email.template, FORGOT_PASSWORD_TEMPLATE);

    let code = &email.variables["code"];
    assert_eq!(code.len(), 6);
    let stored = h.store.value(&forgot_key(account.id)).unwrap();
    assert_ne!(&stored, code);
    assert_eq!(h.store.ttl(&forgot_key(account.id)), Some(FORGOT_TTL));
}

#[tokio::test]
async fn should_reject_forgot_for_unknown_email() {
    let h = Harness::new();

    let result = h
        .forgot()
        .execute(ForgotPasswordInput {
            email: "nobody@x.com".to_owned(),
        })
        .await;
    assert!(
        matches!(result, Err(IdentityError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert!(h.publisher.published().is_empty());
}

// ── ResetPassword ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_with_sent_code() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    h.seed_profile(account.id, GrantType::Main);
    forgot(&h, "a@x.com").await;
    let code = sent_code(&h);

    h.reset().execute(reset_input(&code, NEW_PASSWORD)).await.unwrap();

    assert!(h.store.value(&forgot_key(account.id)).is_none());
    let login = h.login();
    let old = login
        .execute(LoginInput {
            email: "a@x.com".to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await;
    assert!(matches!(old, Err(IdentityError::UserAuthFailed)));
    login
        .execute(LoginInput {
            email: "a@x.com".to_owned(),
            password: NEW_PASSWORD.to_owned(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn should_revoke_live_tokens_on_reset() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    h.seed_profile(account.id, GrantType::Main);
    let session = h
        .login()
        .execute(LoginInput {
            email: "a@x.com".to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await
        .unwrap();
    forgot(&h, "a@x.com").await;
    let code = sent_code(&h);

    h.reset().execute(reset_input(&code, NEW_PASSWORD)).await.unwrap();

    let result = h
        .tokens()
        .validate(account.id, &session.refresh_token, TokenPurpose::Refresh)
        .await;
    assert!(matches!(result, Err(IdentityError::InvalidToken)));
}

#[tokio::test]
async fn should_consume_code_on_wrong_guess() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    forgot(&h, "a@x.com").await;
    let code = sent_code(&h);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let result = h.reset().execute(reset_input(wrong, NEW_PASSWORD)).await;
    assert!(
        matches!(result, Err(IdentityError::CodeNotValid)),
        "expected CodeNotValid, got {result:?}"
    );

    let retry = h.reset().execute(reset_input(&code, NEW_PASSWORD)).await;
    assert!(matches!(retry, Err(IdentityError::CodeNotValid)));
    assert_eq!(
        h.accounts.get(account.id).unwrap().password_hash,
        format!("hashed:{PASSWORD}")
    );
}

#[tokio::test]
async fn should_keep_code_when_new_password_breaks_policy() {
    let h = Harness::new();
    let account = h.seed_account("a@x.com", AccountRole::Client, true);
    forgot(&h, "a@x.com").await;
    let code = sent_code(&h);

    let result = h.reset().execute(reset_input(&code, "nodigits")).await;
    assert!(
        matches!(result, Err(IdentityError::InvalidPassword(PasswordRule::Digit))),
        "expected Digit, got {result:?}"
    );
    assert!(h.store.value(&forgot_key(account.id)).is_some());

    h.reset().execute(reset_input(&code, NEW_PASSWORD)).await.unwrap();
}

#[tokio::test]
async fn should_reject_reset_without_pending_code() {
    let h = Harness::new();
    h.seed_account("a@x.com", AccountRole::Client, true);

    let result = h.reset().execute(reset_input("123456", NEW_PASSWORD)).await;
    assert!(
        matches!(result, Err(IdentityError::CodeNotValid)),
        "expected CodeNotValid, got {result:?}"
    );
}
