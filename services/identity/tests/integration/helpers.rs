use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use uuid::Uuid;

use passage_auth_types::KeyProvider;
use passage_domain::account::{Account, AccountRole};
use passage_domain::chat::MemberChat;
use passage_domain::permission::PermissionTable;
use passage_domain::profile::{GrantType, Profile};
use passage_events::{EventEnvelope, Topic};
use passage_identity::domain::keys::PENDING_PROFILE_PREFIX;
use passage_identity::domain::repository::{
    AccountRepository, CredentialStore, EventPublisher, MemberChatRepository, PasswordHasher,
    ProfileRepository, Transaction, UnitOfWork,
};
use passage_identity::domain::types::{PasswordDigest, RemovedProfile, TokenSettings};
use passage_identity::error::IdentityError;
use passage_identity::gate::AuthGate;
use passage_identity::usecase::events::{EventDispatcher, inbound_registry};
use passage_identity::usecase::group::GroupMembership;
use passage_identity::usecase::login::LoginUseCase;
use passage_identity::usecase::password::{ForgotPasswordUseCase, ResetPasswordUseCase};
use passage_identity::usecase::profile::AttachProfileUseCase;
use passage_identity::usecase::refresh::RefreshTokensUseCase;
use passage_identity::usecase::saga::ProfileSaga;
use passage_identity::usecase::signup::SignUpUseCase;
use passage_identity::usecase::token::TokenService;
use passage_testing::keys::test_key_provider;

pub const PASSWORD: &str = "Password1";
pub const PENDING_TTL: Duration = Duration::from_secs(900);
pub const FORGOT_TTL: Duration = Duration::from_secs(900);

pub const SETTINGS: TokenSettings = TokenSettings {
    access_ttl: Duration::from_secs(15 * 60),
    refresh_ttl: Duration::from_secs(30 * 86_400),
};

fn unavailable(what: &str) -> IdentityError {
    IdentityError::Internal(anyhow!("{what} unavailable"))
}

// ── MemoryCredentialStore ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    pub entries: Arc<Mutex<HashMap<String, String>>>,
    pub ttls: Arc<Mutex<HashMap<String, Duration>>>,
    pub failing: bool,
}

impl MemoryCredentialStore {
    /// Every operation fails as if Redis were down.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.ttls.lock().unwrap().get(key).copied()
    }

    /// Let every pending-profile marker lapse, returning the expired keys.
    pub fn expire_pending(&self) -> Vec<String> {
        let mut entries = self.entries.lock().unwrap();
        let expired: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(PENDING_PROFILE_PREFIX))
            .cloned()
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        expired
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), IdentityError> {
        if self.failing {
            return Err(unavailable("store"));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        self.ttls.lock().unwrap().insert(key.to_owned(), ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        if self.failing {
            return Err(unavailable("store"));
        }
        Ok(self.value(key))
    }

    async fn take_and_delete(&self, key: &str) -> Result<Option<String>, IdentityError> {
        if self.failing {
            return Err(unavailable("store"));
        }
        Ok(self.entries.lock().unwrap().remove(key))
    }

    fn close(&self) {}
}

// ── MemoryAccounts ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryAccounts {
    pub accounts: Arc<Mutex<Vec<Account>>>,
}

impl MemoryAccounts {
    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }
}

impl AccountRepository for MemoryAccounts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn exists_with_email(&self, email: &str) -> Result<bool, IdentityError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, IdentityError> {
        Ok(self.get(id).is_some())
    }

    async fn activate(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| IdentityError::Internal(anyhow!("record not updated")))?;
        account.is_active = true;
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        digest: &PasswordDigest,
    ) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| IdentityError::Internal(anyhow!("record not updated")))?;
        account.password_hash = digest.hash.clone();
        account.password_salt = digest.salt.clone();
        Ok(())
    }
}

// ── MemoryProfiles ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryProfiles {
    pub profiles: Arc<Mutex<Vec<Profile>>>,
    pub deleted: Arc<Mutex<Vec<Uuid>>>,
}

impl MemoryProfiles {
    pub fn of(&self, account_id: Uuid) -> Vec<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }
}

impl ProfileRepository for MemoryProfiles {
    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<Profile>, IdentityError> {
        Ok(self.of(account_id))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<RemovedProfile>, IdentityError> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(index) = profiles.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let profile = profiles.remove(index);
        self.deleted.lock().unwrap().push(id);

        let mut promoted = None;
        if profile.grant_type == GrantType::Main {
            // Insertion order stands in for `created_at`.
            if let Some(next) = profiles
                .iter_mut()
                .find(|p| p.account_id == profile.account_id)
            {
                next.grant_type = GrantType::Main;
                promoted = Some(next.id);
            }
        }
        Ok(Some(RemovedProfile { profile, promoted }))
    }
}

// ── MemoryMemberChats ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryMemberChats {
    pub members: Arc<Mutex<Vec<MemberChat>>>,
}

impl MemoryMemberChats {
    pub fn all(&self) -> Vec<MemberChat> {
        self.members.lock().unwrap().clone()
    }
}

impl MemberChatRepository for MemoryMemberChats {
    async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<MemberChat>, IdentityError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create(&self, member: &MemberChat) -> Result<(), IdentityError> {
        self.members.lock().unwrap().push(member.clone());
        Ok(())
    }
}

// ── MemoryUnitOfWork ─────────────────────────────────────────────────────────

enum Op {
    Account(Account),
    Profile(Profile),
    Grant(Uuid, GrantType),
}

/// Buffers writes and applies them to the shared fakes only on commit.
#[derive(Clone, Default)]
pub struct MemoryUnitOfWork {
    pub accounts: MemoryAccounts,
    pub profiles: MemoryProfiles,
    pub fail_demote: bool,
    pub fail_commit: bool,
    pub commits: Arc<Mutex<u32>>,
    pub rollbacks: Arc<Mutex<u32>>,
}

impl MemoryUnitOfWork {
    pub fn commits(&self) -> u32 {
        *self.commits.lock().unwrap()
    }

    pub fn rollbacks(&self) -> u32 {
        *self.rollbacks.lock().unwrap()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, IdentityError> {
        Ok(MemoryTx {
            uow: self.clone(),
            ops: Vec::new(),
        })
    }
}

pub struct MemoryTx {
    uow: MemoryUnitOfWork,
    ops: Vec<Op>,
}

impl Transaction for MemoryTx {
    async fn insert_account(&mut self, account: &Account) -> Result<(), IdentityError> {
        self.ops.push(Op::Account(account.clone()));
        Ok(())
    }

    async fn find_main_profile(
        &mut self,
        account_id: Uuid,
    ) -> Result<Option<Profile>, IdentityError> {
        Ok(self
            .uow
            .profiles
            .of(account_id)
            .into_iter()
            .find(|p| p.grant_type == GrantType::Main))
    }

    async fn insert_profile(&mut self, profile: &Profile) -> Result<(), IdentityError> {
        self.ops.push(Op::Profile(profile.clone()));
        Ok(())
    }

    async fn set_grant_type(
        &mut self,
        profile_id: Uuid,
        grant_type: GrantType,
    ) -> Result<(), IdentityError> {
        if self.uow.fail_demote {
            return Err(unavailable("database"));
        }
        self.ops.push(Op::Grant(profile_id, grant_type));
        Ok(())
    }

    async fn commit(self) -> Result<(), IdentityError> {
        if self.uow.fail_commit {
            return Err(unavailable("database"));
        }
        for op in self.ops {
            match op {
                Op::Account(account) => self.uow.accounts.accounts.lock().unwrap().push(account),
                Op::Profile(profile) => self.uow.profiles.profiles.lock().unwrap().push(profile),
                Op::Grant(id, grant_type) => {
                    let mut profiles = self.uow.profiles.profiles.lock().unwrap();
                    if let Some(p) = profiles.iter_mut().find(|p| p.id == id) {
                        p.grant_type = grant_type;
                    }
                }
            }
        }
        *self.uow.commits.lock().unwrap() += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), IdentityError> {
        *self.uow.rollbacks.lock().unwrap() += 1;
        Ok(())
    }
}

// ── RecordingPublisher ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub published: Arc<Mutex<Vec<(EventEnvelope, Topic)>>>,
    pub failing: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(EventEnvelope, Topic)> {
        self.published.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    async fn publish(&self, envelope: &EventEnvelope, topic: Topic) -> Result<(), IdentityError> {
        if self.failing {
            return Err(unavailable("broker"));
        }
        self.published
            .lock()
            .unwrap()
            .push((envelope.clone(), topic));
        Ok(())
    }
}

// ── PlainHasher ──────────────────────────────────────────────────────────────

/// Reversible stand-in for argon2 so tests stay fast.
#[derive(Clone, Default)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<PasswordDigest, IdentityError> {
        Ok(PasswordDigest {
            hash: format!("hashed:{password}"),
            salt: "salt".to_owned(),
        })
    }

    fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, IdentityError> {
        Ok(digest.hash == format!("hashed:{password}"))
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub type MemorySaga =
    ProfileSaga<MemoryAccounts, MemoryProfiles, MemoryCredentialStore, RecordingPublisher>;

/// All fakes share state through `Arc` handles, so every use case built from one
/// harness sees the same accounts, profiles and store.
pub struct Harness {
    pub store: MemoryCredentialStore,
    pub accounts: MemoryAccounts,
    pub profiles: MemoryProfiles,
    pub members: MemoryMemberChats,
    pub publisher: RecordingPublisher,
    pub uow: MemoryUnitOfWork,
    pub keys: Arc<KeyProvider>,
    pub permissions: Arc<PermissionTable>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MemoryCredentialStore::default(), RecordingPublisher::default())
    }

    pub fn with(store: MemoryCredentialStore, publisher: RecordingPublisher) -> Self {
        let accounts = MemoryAccounts::default();
        let profiles = MemoryProfiles::default();
        let uow = MemoryUnitOfWork {
            accounts: accounts.clone(),
            profiles: profiles.clone(),
            ..MemoryUnitOfWork::default()
        };
        Self {
            store,
            accounts,
            profiles,
            members: MemoryMemberChats::default(),
            publisher,
            uow,
            keys: Arc::new(test_key_provider()),
            permissions: Arc::new(PermissionTable::standard()),
        }
    }

    pub fn failing_demotion(mut self) -> Self {
        self.uow.fail_demote = true;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.uow.fail_commit = true;
        self
    }

    // ── seeding ──

    pub fn seed_account(&self, email: &str, role: AccountRole, is_active: bool) -> Account {
        let digest = PlainHasher.hash(PASSWORD).unwrap();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: digest.hash,
            password_salt: digest.salt,
            is_active,
            role,
        };
        self.accounts.accounts.lock().unwrap().push(account.clone());
        account
    }

    pub fn seed_profile(&self, account_id: Uuid, grant_type: GrantType) -> Profile {
        let profile = Profile::new(account_id, grant_type);
        self.profiles.profiles.lock().unwrap().push(profile.clone());
        profile
    }

    // ── components ──

    pub fn tokens(&self) -> TokenService<MemoryCredentialStore> {
        TokenService {
            store: self.store.clone(),
            keys: Arc::clone(&self.keys),
            settings: SETTINGS,
        }
    }

    pub fn saga(&self) -> MemorySaga {
        ProfileSaga {
            accounts: self.accounts.clone(),
            profiles: self.profiles.clone(),
            store: self.store.clone(),
            publisher: self.publisher.clone(),
            pending_ttl: PENDING_TTL,
        }
    }

    pub fn gate(&self) -> AuthGate<MemoryAccounts, MemoryCredentialStore> {
        AuthGate {
            keys: Arc::clone(&self.keys),
            tokens: self.tokens(),
            accounts: self.accounts.clone(),
        }
    }

    pub fn sign_up(
        &self,
    ) -> SignUpUseCase<
        MemoryAccounts,
        MemoryProfiles,
        MemoryCredentialStore,
        RecordingPublisher,
        MemoryUnitOfWork,
        PlainHasher,
    > {
        SignUpUseCase {
            accounts: self.accounts.clone(),
            uow: self.uow.clone(),
            hasher: PlainHasher,
            saga: self.saga(),
            tokens: self.tokens(),
            permissions: Arc::clone(&self.permissions),
        }
    }

    pub fn login(
        &self,
    ) -> LoginUseCase<MemoryAccounts, MemoryProfiles, MemoryCredentialStore, PlainHasher> {
        LoginUseCase {
            accounts: self.accounts.clone(),
            profiles: self.profiles.clone(),
            hasher: PlainHasher,
            tokens: self.tokens(),
            permissions: Arc::clone(&self.permissions),
        }
    }

    pub fn attach(
        &self,
    ) -> AttachProfileUseCase<
        MemoryAccounts,
        MemoryProfiles,
        MemoryCredentialStore,
        RecordingPublisher,
        MemoryUnitOfWork,
    > {
        AttachProfileUseCase {
            accounts: self.accounts.clone(),
            profiles: self.profiles.clone(),
            uow: self.uow.clone(),
            saga: self.saga(),
            tokens: self.tokens(),
            permissions: Arc::clone(&self.permissions),
        }
    }

    pub fn refresh(
        &self,
    ) -> RefreshTokensUseCase<MemoryAccounts, MemoryProfiles, MemoryCredentialStore> {
        RefreshTokensUseCase {
            accounts: self.accounts.clone(),
            profiles: self.profiles.clone(),
            tokens: self.tokens(),
            permissions: Arc::clone(&self.permissions),
        }
    }

    pub fn forgot(
        &self,
    ) -> ForgotPasswordUseCase<MemoryAccounts, MemoryCredentialStore, RecordingPublisher> {
        ForgotPasswordUseCase {
            accounts: self.accounts.clone(),
            store: self.store.clone(),
            publisher: self.publisher.clone(),
            code_ttl: FORGOT_TTL,
        }
    }

    pub fn reset(&self) -> ResetPasswordUseCase<MemoryAccounts, MemoryCredentialStore, PlainHasher> {
        ResetPasswordUseCase {
            accounts: self.accounts.clone(),
            store: self.store.clone(),
            hasher: PlainHasher,
            tokens: self.tokens(),
        }
    }

    pub fn groups(&self) -> GroupMembership<MemoryAccounts, MemoryMemberChats> {
        GroupMembership {
            accounts: self.accounts.clone(),
            members: self.members.clone(),
        }
    }

    pub fn dispatcher(
        &self,
    ) -> EventDispatcher<
        MemoryAccounts,
        MemoryProfiles,
        MemoryCredentialStore,
        RecordingPublisher,
        MemoryMemberChats,
    > {
        EventDispatcher {
            registry: inbound_registry(),
            saga: self.saga(),
            groups: self.groups(),
        }
    }
}
