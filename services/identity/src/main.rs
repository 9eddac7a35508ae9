use std::sync::Arc;

use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tracing::info;

use passage_auth_types::KeyProvider;
use passage_core::config::Config;
use passage_core::tracing::init_tracing;
use passage_domain::permission::PermissionTable;
use passage_events::Topic;
use passage_identity::config::IdentityConfig;
use passage_identity::domain::repository::CredentialStore;
use passage_identity::infra::broker::RedisStreamConsumer;
use passage_identity::infra::expiry::KeyExpiryListener;
use passage_identity::router::build_router;
use passage_identity::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = IdentityConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let private_pem =
        std::fs::read(&config.jwt_private_key_path).expect("failed to read JWT_PRIVATE_KEY_PATH");
    let public_pem = std::fs::read_to_string(&config.jwt_public_key_path)
        .expect("failed to read JWT_PUBLIC_KEY_PATH");
    let keys = KeyProvider::from_rsa_pem(
        &private_pem,
        &public_pem,
        config.jwt_issuer.clone(),
        config.jwt_audience.clone(),
    )
    .expect("invalid JWT key pair");
    info!(kid = keys.kid(), "signing key loaded");

    let state = AppState {
        db,
        redis: redis.clone(),
        keys: Arc::new(keys),
        permissions: Arc::new(PermissionTable::standard()),
        token_settings: config.token_settings(),
        pending_profile_ttl: config.pending_profile_ttl(),
        forgot_code_ttl: config.forgot_code_ttl(),
    };

    let cancel = CancellationToken::new();

    let redis_db = config.redis_db().expect("invalid REDIS_URL");
    let stream_client =
        deadpool_redis::redis::Client::open(config.redis_url.as_str()).expect("invalid REDIS_URL");

    let consumer = RedisStreamConsumer {
        client: stream_client,
        topic: Topic::MessagingEvents,
        group: config.consumer_group.clone(),
        consumer: config.consumer_name.clone(),
    };
    let consumer_task = tokio::spawn(consumer.run(state.event_dispatcher(), cancel.clone()));

    let expiry = KeyExpiryListener {
        pool: redis.clone(),
        redis_url: config.redis_url.clone(),
        db: redis_db,
    };
    let expiry_task = tokio::spawn(expiry.run(state.profile_saga(), cancel.clone()));

    let store = state.credential_store();
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.identity_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("identity service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl-C handler");
            info!("shutdown signal received");
        })
        .await
        .expect("server error");

    cancel.cancel();
    let _ = tokio::join!(consumer_task, expiry_task);
    store.close();
    info!("identity service stopped");
}
