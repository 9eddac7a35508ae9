use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use passage_domain::account::{Account, AccountRole};
use passage_domain::chat::{ChatRole, MemberChat};
use passage_domain::profile::{GrantType, Profile};
use passage_domain::status::RecordStatus;
use passage_identity_schema::{accounts, member_chats, profiles};

use crate::domain::repository::{
    AccountRepository, MemberChatRepository, ProfileRepository, Transaction, UnitOfWork,
};
use crate::domain::types::{PasswordDigest, RemovedProfile};
use crate::error::IdentityError;

const ACTIVE: &str = RecordStatus::Active.as_str();
const DELETED: &str = RecordStatus::Deleted.as_str();

// ── Account repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        let model = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::Status.eq(ACTIVE))
            .one(&self.db)
            .await
            .context("find account by id")?;
        model.map(account_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .filter(accounts::Column::Status.eq(ACTIVE))
            .one(&self.db)
            .await
            .context("find account by email")?;
        model.map(account_from_model).transpose()
    }

    async fn exists_with_email(&self, email: &str) -> Result<bool, IdentityError> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .filter(accounts::Column::Status.eq(ACTIVE))
            .count(&self.db)
            .await
            .context("count accounts by email")?;
        Ok(count > 0)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, IdentityError> {
        let count = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::Status.eq(ACTIVE))
            .count(&self.db)
            .await
            .context("count accounts by id")?;
        Ok(count > 0)
    }

    async fn activate(&self, id: Uuid) -> Result<(), IdentityError> {
        accounts::ActiveModel {
            id: Set(id),
            is_active: Set(true),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("activate account")?;
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        digest: &PasswordDigest,
    ) -> Result<(), IdentityError> {
        accounts::ActiveModel {
            id: Set(id),
            password_hash: Set(digest.hash.clone()),
            password_salt: Set(digest.salt.clone()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update account password")?;
        Ok(())
    }
}

fn account_from_model(model: accounts::Model) -> Result<Account, IdentityError> {
    let role: AccountRole = model
        .role
        .parse()
        .with_context(|| format!("account {} has an unreadable role", model.id))?;
    Ok(Account {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        password_salt: model.password_salt,
        is_active: model.is_active,
        role,
    })
}

// ── Profile repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProfileRepository {
    pub db: DatabaseConnection,
}

impl ProfileRepository for DbProfileRepository {
    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<Profile>, IdentityError> {
        let models = profiles::Entity::find()
            .filter(profiles::Column::AccountId.eq(account_id))
            .filter(profiles::Column::Status.eq(ACTIVE))
            .order_by_asc(profiles::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list profiles by account")?;
        models.into_iter().map(profile_from_model).collect()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<RemovedProfile>, IdentityError> {
        let txn = self.db.begin().await.context("begin transaction")?;

        let Some(model) = profiles::Entity::find_by_id(id)
            .filter(profiles::Column::Status.eq(ACTIVE))
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock profile for removal")?
        else {
            txn.rollback().await.context("roll back transaction")?;
            return Ok(None);
        };
        let profile = profile_from_model(model)?;

        let now = Utc::now();
        profiles::Entity::update_many()
            .col_expr(profiles::Column::Status, Expr::value(DELETED))
            .col_expr(profiles::Column::UpdatedAt, Expr::value(now))
            .filter(profiles::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("soft-delete profile")?;

        let mut promoted = None;
        if profile.grant_type == GrantType::Main {
            let next = profiles::Entity::find()
                .filter(profiles::Column::AccountId.eq(profile.account_id))
                .filter(profiles::Column::Status.eq(ACTIVE))
                .order_by_asc(profiles::Column::CreatedAt)
                .lock_exclusive()
                .one(&txn)
                .await
                .context("find profile to promote")?;
            if let Some(next) = next {
                profiles::ActiveModel {
                    id: Set(next.id),
                    grant_type: Set(GrantType::Main.as_u8() as i16),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(&txn)
                .await
                .context("promote profile to main")?;
                promoted = Some(next.id);
            }
        }

        txn.commit().await.context("commit transaction")?;
        Ok(Some(RemovedProfile { profile, promoted }))
    }
}

fn profile_from_model(model: profiles::Model) -> Result<Profile, IdentityError> {
    let grant_type = u8::try_from(model.grant_type)
        .ok()
        .and_then(GrantType::from_u8)
        .with_context(|| {
            format!(
                "profile {} has unknown grant type {}",
                model.id, model.grant_type
            )
        })?;
    Ok(Profile {
        id: model.id,
        account_id: model.account_id,
        grant_type,
    })
}

// ── Member chat repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMemberChatRepository {
    pub db: DatabaseConnection,
}

impl MemberChatRepository for DbMemberChatRepository {
    async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<MemberChat>, IdentityError> {
        let models = member_chats::Entity::find()
            .filter(member_chats::Column::GroupId.eq(group_id))
            .filter(member_chats::Column::Status.eq(ACTIVE))
            .all(&self.db)
            .await
            .context("list member chats by group")?;
        models.into_iter().map(member_from_model).collect()
    }

    async fn create(&self, member: &MemberChat) -> Result<(), IdentityError> {
        member_chats::ActiveModel {
            id: Set(member.id),
            group_id: Set(member.group_id),
            member_id: Set(member.member_id),
            role: Set(member.role.as_str().to_owned()),
            status: Set(ACTIVE.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert member chat")?;
        Ok(())
    }
}

fn member_from_model(model: member_chats::Model) -> Result<MemberChat, IdentityError> {
    let role: ChatRole = model
        .role
        .parse()
        .with_context(|| format!("member chat {} has an unreadable role", model.id))?;
    Ok(MemberChat {
        id: model.id,
        group_id: model.group_id,
        member_id: model.member_id,
        role,
    })
}

// ── Unit of work ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUnitOfWork {
    pub db: DatabaseConnection,
}

impl UnitOfWork for DbUnitOfWork {
    type Tx = DbTransaction;

    async fn begin(&self) -> Result<DbTransaction, IdentityError> {
        let txn = self.db.begin().await.context("begin transaction")?;
        Ok(DbTransaction { txn })
    }
}

pub struct DbTransaction {
    txn: DatabaseTransaction,
}

impl Transaction for DbTransaction {
    async fn insert_account(&mut self, account: &Account) -> Result<(), IdentityError> {
        let now = Utc::now();
        accounts::ActiveModel {
            id: Set(account.id),
            email: Set(account.email.clone()),
            password_hash: Set(account.password_hash.clone()),
            password_salt: Set(account.password_salt.clone()),
            is_active: Set(account.is_active),
            role: Set(account.role.as_str().to_owned()),
            status: Set(ACTIVE.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.txn)
        .await
        .context("insert account")?;
        Ok(())
    }

    async fn find_main_profile(
        &mut self,
        account_id: Uuid,
    ) -> Result<Option<Profile>, IdentityError> {
        let model = profiles::Entity::find()
            .filter(profiles::Column::AccountId.eq(account_id))
            .filter(profiles::Column::GrantType.eq(GrantType::Main.as_u8() as i16))
            .filter(profiles::Column::Status.eq(ACTIVE))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .context("find main profile")?;
        model.map(profile_from_model).transpose()
    }

    async fn insert_profile(&mut self, profile: &Profile) -> Result<(), IdentityError> {
        let now = Utc::now();
        profiles::ActiveModel {
            id: Set(profile.id),
            account_id: Set(profile.account_id),
            grant_type: Set(profile.grant_type.as_u8() as i16),
            status: Set(ACTIVE.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => IdentityError::Internal(
                anyhow::Error::new(e).context("account already holds a main profile"),
            ),
            _ => IdentityError::Internal(anyhow::Error::new(e).context("insert profile")),
        })?;
        Ok(())
    }

    async fn set_grant_type(
        &mut self,
        profile_id: Uuid,
        grant_type: GrantType,
    ) -> Result<(), IdentityError> {
        profiles::ActiveModel {
            id: Set(profile_id),
            grant_type: Set(grant_type.as_u8() as i16),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .context("update profile grant type")?;
        Ok(())
    }

    async fn commit(self) -> Result<(), IdentityError> {
        self.txn.commit().await.context("commit transaction")?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), IdentityError> {
        self.txn.rollback().await.context("roll back transaction")?;
        Ok(())
    }
}
