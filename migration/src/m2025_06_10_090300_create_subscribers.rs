//! Migration to create the subscribers table.
//!
//! One row per (project, email) pair. Emails are stored lower-cased by the
//! application, so the composite unique index is the upsert target.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscribers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscribers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscribers::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Subscribers::WidgetId).uuid().null())
                    .col(ColumnDef::new(Subscribers::Email).text().not_null())
                    .col(ColumnDef::new(Subscribers::Metadata).json_binary().null())
                    .col(ColumnDef::new(Subscribers::Source).text().null())
                    .col(
                        ColumnDef::new(Subscribers::SubscribedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscribers_project_id")
                            .from(Subscribers::Table, Subscribers::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscribers_widget_id")
                            .from(Subscribers::Table, Subscribers::WidgetId)
                            .to(Widgets::Table, Widgets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscribers_project_email")
                    .table(Subscribers::Table)
                    .col(Subscribers::ProjectId)
                    .col(Subscribers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Cursor pagination orders by (subscribed_at, id) within a project
        manager
            .create_index(
                Index::create()
                    .name("idx_subscribers_project_subscribed_at")
                    .table(Subscribers::Table)
                    .col(Subscribers::ProjectId)
                    .col(Subscribers::SubscribedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_subscribers_project_subscribed_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_subscribers_project_email")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Subscribers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Subscribers {
    Table,
    Id,
    ProjectId,
    WidgetId,
    Email,
    Metadata,
    Source,
    SubscribedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Widgets {
    Table,
    Id,
}
