// ABOUTME: Initial migration to create the items and attachments tables
// ABOUTME: Attachments reference their item and cascade when the item is deleted

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::ModelName).string_len(100))
                    .col(ColumnDef::new(Items::ModelNumber).string_len(100))
                    .col(ColumnDef::new(Items::SerialNumber).string_len(100))
                    .col(ColumnDef::new(Items::Manufacturer).string_len(100))
                    .col(ColumnDef::new(Items::ManufacturedDate).date())
                    .col(ColumnDef::new(Items::Description).text())
                    .col(ColumnDef::new(Items::FriendlyName).string_len(100))
                    .col(ColumnDef::new(Items::PurchaseDate).date())
                    .col(ColumnDef::new(Items::PurchasePrice).double())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachments::ItemId).integer().not_null())
                    .col(
                        ColumnDef::new(Attachments::Filename)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Attachments::OriginalFilename)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachments::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Attachments::ContentType).string_len(100))
                    .col(
                        ColumnDef::new(Attachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachments_item_id")
                            .from(Attachments::Table, Attachments::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attachments_item_id")
                    .table(Attachments::Table)
                    .col(Attachments::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    ModelName,
    ModelNumber,
    SerialNumber,
    Manufacturer,
    ManufacturedDate,
    Description,
    FriendlyName,
    PurchaseDate,
    PurchasePrice,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    ItemId,
    Filename,
    OriginalFilename,
    FileSize,
    ContentType,
    CreatedAt,
}
