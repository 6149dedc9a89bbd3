use async_trait::async_trait;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Organization {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    UserGuid,
    UserType,
    Username,
    Roles,
    OrgId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Role {
    Table,
    Id,
    User,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Invitation {
    Table,
    Id,
    UserId,
    ExpiresAt,
    AcceptedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Session {
    Table,
    Id,
    UserId,
    CreatedAt,
}

#[async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(char_len(Organization::Id, 26).primary_key())
                    .col(string(Organization::Name))
                    .col(timestamp_with_time_zone(Organization::CreatedAt))
                    .col(timestamp_with_time_zone(Organization::UpdatedAt))
                    .take(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(char_len(User::Id, 26).primary_key())
                    .col(string(User::UserGuid).default(""))
                    .col(string_null(User::UserType))
                    .col(string_uniq(User::Username))
                    .col(json_binary(User::Roles))
                    .col(char_len_null(User::OrgId, 26))
                    .col(timestamp_with_time_zone(User::CreatedAt))
                    .col(timestamp_with_time_zone(User::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_org_id")
                            .from(User::Table, User::OrgId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .take(),
            )
            .await?;

        manager
            .create_index(Index::create().name("idx_user_user_guid").table(User::Table).col(User::UserGuid).take())
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(char_len(Role::Id, 26).primary_key())
                    .col(string(Role::User))
                    .col(string(Role::Role))
                    .col(timestamp_with_time_zone(Role::CreatedAt))
                    .col(timestamp_with_time_zone(Role::UpdatedAt))
                    .take(),
            )
            .await?;

        manager.create_index(Index::create().name("idx_role_user").table(Role::Table).col(Role::User).take()).await?;

        manager
            .create_table(
                Table::create()
                    .table(Invitation::Table)
                    .if_not_exists()
                    .col(char_len(Invitation::Id, 26).primary_key())
                    .col(char_len(Invitation::UserId, 26))
                    .col(timestamp_with_time_zone_null(Invitation::ExpiresAt))
                    .col(timestamp_with_time_zone_null(Invitation::AcceptedAt))
                    .col(timestamp_with_time_zone(Invitation::CreatedAt))
                    .col(timestamp_with_time_zone(Invitation::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitation_user_id")
                            .from(Invitation::Table, Invitation::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .take(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Session::Table)
                    .if_not_exists()
                    .col(string(Session::Id).primary_key())
                    .col(char_len(Session::UserId, 26))
                    .col(timestamp_with_time_zone(Session::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_user_id")
                            .from(Session::Table, Session::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Session::Table).if_exists().take()).await?;
        manager.drop_table(Table::drop().table(Invitation::Table).if_exists().take()).await?;
        manager.drop_table(Table::drop().table(Role::Table).if_exists().take()).await?;
        manager.drop_table(Table::drop().table(User::Table).if_exists().take()).await?;
        manager.drop_table(Table::drop().table(Organization::Table).if_exists().take()).await
    }
}
