use sea_orm_migration::prelude::*;

/// At most one live `Main` (grant type 0) per account. Concurrent promotions that
/// both read the same current main fail here instead of leaving two.
const MAIN_PROFILE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS uq_profiles_live_main \
     ON profiles (account_id) WHERE grant_type = 0 AND status = 'active'";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Profiles::GrantType).small_integer().not_null())
                    .col(
                        ColumnDef::new(Profiles::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Profiles::Table, Profiles::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Profiles::Table)
                    .col(Profiles::AccountId)
                    .name("idx_profiles_account_id")
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(MAIN_PROFILE_INDEX)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Profiles {
    Table,
    Id,
    AccountId,
    GrantType,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}
