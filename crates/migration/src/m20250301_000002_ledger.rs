use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountTypes::Name).string().not_null())
                    .col(
                        ColumnDef::new(AccountTypes::IsExpense)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountTypes::Kind).integer().not_null())
                    .col(
                        ColumnDef::new(AccountTypes::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AccountTypes::CreateTime).string().not_null())
                    .col(ColumnDef::new(AccountTypes::UpdateTime).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Store, category and user references are plain columns: entries
        // must survive the deletion of what they point at.
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::StoreId).integer().not_null())
                    .col(ColumnDef::new(Accounts::UserId).integer().not_null())
                    .col(ColumnDef::new(Accounts::TypeId).integer().not_null())
                    .col(ColumnDef::new(Accounts::Amount).double().not_null())
                    .col(ColumnDef::new(Accounts::Remark).string())
                    .col(
                        ColumnDef::new(Accounts::TransactionTime)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::CreateTime).string().not_null())
                    .col(ColumnDef::new(Accounts::UpdateTime).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-transaction_time")
                    .table(Accounts::Table)
                    .col(Accounts::TransactionTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-store_id")
                    .table(Accounts::Table)
                    .col(Accounts::StoreId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-type_id")
                    .table(Accounts::Table)
                    .col(Accounts::TypeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountTypes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum AccountTypes {
    Table,
    Id,
    Name,
    IsExpense,
    Kind,
    SortOrder,
    CreateTime,
    UpdateTime,
}

#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    StoreId,
    UserId,
    TypeId,
    Amount,
    Remark,
    TransactionTime,
    CreateTime,
    UpdateTime,
}
