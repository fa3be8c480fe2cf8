use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Nickname).string())
                    .col(ColumnDef::new(Users::Role).integer().not_null())
                    .col(ColumnDef::new(Users::CreateTime).string().not_null())
                    .col(ColumnDef::new(Users::UpdateTime).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stores::Name).string().not_null())
                    .col(ColumnDef::new(Stores::Address).string())
                    .col(ColumnDef::new(Stores::Phone).string())
                    .col(ColumnDef::new(Stores::CreateTime).string().not_null())
                    .col(ColumnDef::new(Stores::UpdateTime).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserStorePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserStorePermissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserStorePermissions::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserStorePermissions::StoreId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserStorePermissions::CreateTime)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_store_permissions-user_id")
                            .from(UserStorePermissions::Table, UserStorePermissions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_store_permissions-store_id")
                            .from(UserStorePermissions::Table, UserStorePermissions::StoreId)
                            .to(Stores::Table, Stores::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_store_permissions-user_id-store_id-unique")
                    .table(UserStorePermissions::Table)
                    .col(UserStorePermissions::UserId)
                    .col(UserStorePermissions::StoreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserDefaultSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserDefaultSettings::UserId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserDefaultSettings::StoreId).integer())
                    .col(ColumnDef::new(UserDefaultSettings::IncomeTypeId).integer())
                    .col(ColumnDef::new(UserDefaultSettings::ExpenseTypeId).integer())
                    .col(
                        ColumnDef::new(UserDefaultSettings::UpdateTime)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_default_settings-user_id")
                            .from(UserDefaultSettings::Table, UserDefaultSettings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_default_settings-store_id")
                            .from(UserDefaultSettings::Table, UserDefaultSettings::StoreId)
                            .to(Stores::Table, Stores::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserDefaultSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserStorePermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Username,
    Nickname,
    Role,
    CreateTime,
    UpdateTime,
}

#[derive(Iden)]
pub enum Stores {
    Table,
    Id,
    Name,
    Address,
    Phone,
    CreateTime,
    UpdateTime,
}

#[derive(Iden)]
pub enum UserStorePermissions {
    Table,
    Id,
    UserId,
    StoreId,
    CreateTime,
}

#[derive(Iden)]
pub enum UserDefaultSettings {
    Table,
    UserId,
    StoreId,
    IncomeTypeId,
    ExpenseTypeId,
    UpdateTime,
}
