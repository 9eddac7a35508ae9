use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MemberChats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MemberChats::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MemberChats::GroupId).uuid().not_null())
                    .col(ColumnDef::new(MemberChats::MemberId).uuid().not_null())
                    .col(ColumnDef::new(MemberChats::Role).string().not_null())
                    .col(
                        ColumnDef::new(MemberChats::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(MemberChats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(MemberChats::Table)
                    .col(MemberChats::GroupId)
                    .col(MemberChats::MemberId)
                    .name("idx_member_chats_group_member")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MemberChats::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MemberChats {
    Table,
    Id,
    GroupId,
    MemberId,
    Role,
    Status,
    CreatedAt,
}
