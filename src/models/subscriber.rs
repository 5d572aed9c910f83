//! Subscriber entity model
//!
//! This module contains the SeaORM entity model for the subscribers table.
//! Rows are unique per (project_id, email); repeat signups update metadata
//! in place and keep the original subscribed_at.

use super::project::Entity as Project;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Subscriber entity representing one captured email address
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscribers")]
pub struct Model {
    /// Unique identifier for the subscriber (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Project this subscriber belongs to
    pub project_id: Uuid,

    /// Widget that captured the most recent signup, if known
    pub widget_id: Option<Uuid>,

    /// Email address, stored lower-cased
    pub email: String,

    /// Client- and server-provided context, kept under separate keys
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Option<JsonValue>,

    /// Embed variant that produced the signup (popup, inline, inline-html)
    pub source: Option<String>,

    /// Timestamp of the first signup for this (project, email) pair
    pub subscribed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Project",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::widget::Entity",
        from = "Column::WidgetId",
        to = "super::widget::Column::Id"
    )]
    Widget,
}

impl Related<Project> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::widget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Widget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
