use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsageRecords::StoreId).integer().not_null())
                    .col(ColumnDef::new(UsageRecords::UserId).integer().not_null())
                    .col(ColumnDef::new(UsageRecords::Item).string().not_null())
                    .col(ColumnDef::new(UsageRecords::Quantity).double().not_null())
                    .col(ColumnDef::new(UsageRecords::UsageDate).string().not_null())
                    .col(ColumnDef::new(UsageRecords::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-usage_records-store_id-usage_date")
                    .table(UsageRecords::Table)
                    .col(UsageRecords::StoreId)
                    .col(UsageRecords::UsageDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsageRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UsageRecords {
    Table,
    Id,
    StoreId,
    UserId,
    Item,
    Quantity,
    UsageDate,
    CreatedAt,
}
