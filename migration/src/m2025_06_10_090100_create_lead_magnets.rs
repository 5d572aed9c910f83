//! Migration to create the lead_magnets table.
//!
//! A lead magnet is the post-signup reveal content of a widget. The
//! description is a rich-text document tree rendered server-side when the
//! widget script is generated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeadMagnets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeadMagnets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeadMagnets::Description).json_binary().null())
                    .col(ColumnDef::new(LeadMagnets::PreviewText).text().null())
                    .col(
                        ColumnDef::new(LeadMagnets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeadMagnets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeadMagnets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeadMagnets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeadMagnets {
    Table,
    Id,
    Description,
    PreviewText,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
