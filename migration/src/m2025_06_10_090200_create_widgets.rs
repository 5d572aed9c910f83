//! Migration to create the widgets table.
//!
//! A widget is one embeddable capture form configuration: content, styling
//! and behavior for both the popup and inline renditions. Every project with
//! widgets has exactly one default, enforced by a partial unique index.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{DatabaseBackend, Statement};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Widgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Widgets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Widgets::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Widgets::Name).text().not_null())
                    .col(ColumnDef::new(Widgets::Title).text().null())
                    .col(ColumnDef::new(Widgets::Description).text().null())
                    .col(ColumnDef::new(Widgets::ButtonText).text().null())
                    .col(ColumnDef::new(Widgets::SuccessMessage).text().null())
                    .col(ColumnDef::new(Widgets::Placeholder).text().null())
                    .col(ColumnDef::new(Widgets::PrimaryColor).text().null())
                    .col(ColumnDef::new(Widgets::BackgroundColor).text().null())
                    .col(ColumnDef::new(Widgets::TextColor).text().null())
                    .col(ColumnDef::new(Widgets::BorderRadius).integer().null())
                    .col(ColumnDef::new(Widgets::Position).text().null())
                    .col(ColumnDef::new(Widgets::TriggerType).text().null())
                    .col(ColumnDef::new(Widgets::TriggerValue).integer().null())
                    .col(ColumnDef::new(Widgets::Layout).text().null())
                    .col(ColumnDef::new(Widgets::LeadMagnetId).uuid().null())
                    .col(
                        ColumnDef::new(Widgets::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Widgets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Widgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Widgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_widgets_project_id")
                            .from(Widgets::Table, Widgets::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_widgets_lead_magnet_id")
                            .from(Widgets::Table, Widgets::LeadMagnetId)
                            .to(LeadMagnets::Table, LeadMagnets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_widgets_project_id")
                    .table(Widgets::Table)
                    .col(Widgets::ProjectId)
                    .to_owned(),
            )
            .await?;

        // At most one default widget per project. Partial indexes need raw SQL;
        // the Postgres arm stays idempotent under re-runs.
        let backend = manager.get_database_backend();
        match backend {
            DatabaseBackend::Postgres => {
                manager
                    .get_connection()
                    .execute(Statement::from_string(
                        backend,
                        "DO $$\nBEGIN\n    IF NOT EXISTS (\n        SELECT 1 FROM pg_indexes\n        WHERE schemaname = current_schema()\n          AND indexname = 'idx_widgets_project_default'\n    ) THEN\n        CREATE UNIQUE INDEX idx_widgets_project_default\n            ON widgets (project_id)\n            WHERE is_default;\n    END IF;\nEND\n$$;"
                            .to_string(),
                    ))
                    .await
                    .map(|_| ())?;
            }
            _ => {
                manager
                    .get_connection()
                    .execute(Statement::from_string(
                        backend,
                        "CREATE UNIQUE INDEX IF NOT EXISTS idx_widgets_project_default \
                         ON widgets (project_id) \
                         WHERE is_default"
                            .to_string(),
                    ))
                    .await
                    .map(|_| ())?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "DROP INDEX IF EXISTS idx_widgets_project_default",
            ))
            .await
            .map(|_| ())?;

        manager
            .drop_index(Index::drop().name("idx_widgets_project_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Widgets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Widgets {
    Table,
    Id,
    ProjectId,
    Name,
    Title,
    Description,
    ButtonText,
    SuccessMessage,
    Placeholder,
    PrimaryColor,
    BackgroundColor,
    TextColor,
    BorderRadius,
    Position,
    TriggerType,
    TriggerValue,
    Layout,
    LeadMagnetId,
    IsDefault,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LeadMagnets {
    Table,
    Id,
}
