use std::sync::Arc;
use std::time::Duration;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use passage_auth_types::KeyProvider;
use passage_domain::permission::PermissionTable;

use crate::domain::types::TokenSettings;
use crate::gate::AuthGate;
use crate::infra::broker::RedisStreamPublisher;
use crate::infra::cache::RedisCredentialStore;
use crate::infra::db::{
    DbAccountRepository, DbMemberChatRepository, DbProfileRepository, DbUnitOfWork,
};
use crate::infra::password::Argon2Hasher;
use crate::usecase::events::{EventDispatcher, inbound_registry};
use crate::usecase::group::GroupMembership;
use crate::usecase::saga::ProfileSaga;
use crate::usecase::token::TokenService;

pub type Saga =
    ProfileSaga<DbAccountRepository, DbProfileRepository, RedisCredentialStore, RedisStreamPublisher>;

pub type Dispatcher = EventDispatcher<
    DbAccountRepository,
    DbProfileRepository,
    RedisCredentialStore,
    RedisStreamPublisher,
    DbMemberChatRepository,
>;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub keys: Arc<KeyProvider>,
    pub permissions: Arc<PermissionTable>,
    pub token_settings: TokenSettings,
    pub pending_profile_ttl: Duration,
    pub forgot_code_ttl: Duration,
}

impl AppState {
    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn profile_repo(&self) -> DbProfileRepository {
        DbProfileRepository {
            db: self.db.clone(),
        }
    }

    pub fn member_chat_repo(&self) -> DbMemberChatRepository {
        DbMemberChatRepository {
            db: self.db.clone(),
        }
    }

    pub fn unit_of_work(&self) -> DbUnitOfWork {
        DbUnitOfWork {
            db: self.db.clone(),
        }
    }

    pub fn credential_store(&self) -> RedisCredentialStore {
        RedisCredentialStore {
            pool: self.redis.clone(),
        }
    }

    pub fn event_publisher(&self) -> RedisStreamPublisher {
        RedisStreamPublisher {
            pool: self.redis.clone(),
        }
    }

    pub fn password_hasher(&self) -> Argon2Hasher {
        Argon2Hasher
    }

    pub fn token_service(&self) -> TokenService<RedisCredentialStore> {
        TokenService {
            store: self.credential_store(),
            keys: Arc::clone(&self.keys),
            settings: self.token_settings,
        }
    }

    pub fn profile_saga(&self) -> Saga {
        ProfileSaga {
            accounts: self.account_repo(),
            profiles: self.profile_repo(),
            store: self.credential_store(),
            publisher: self.event_publisher(),
            pending_ttl: self.pending_profile_ttl,
        }
    }

    pub fn auth_gate(&self) -> AuthGate<DbAccountRepository, RedisCredentialStore> {
        AuthGate {
            keys: Arc::clone(&self.keys),
            tokens: self.token_service(),
            accounts: self.account_repo(),
        }
    }

    pub fn event_dispatcher(&self) -> Dispatcher {
        EventDispatcher {
            registry: inbound_registry(),
            saga: self.profile_saga(),
            groups: GroupMembership {
                accounts: self.account_repo(),
                members: self.member_chat_repo(),
            },
        }
    }
}
