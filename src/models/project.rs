//! Project entity model
//!
//! This module contains the SeaORM entity model for the projects table,
//! the tenant root every widget, subscriber and API key belongs to.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Project entity representing one tenant workspace
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Unique identifier for the project (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Identifier of the account that owns this project
    pub owner_id: Uuid,

    /// Display name for the project
    pub name: String,

    /// Inactive projects serve no artifacts and accept no subscriptions
    pub is_active: bool,

    /// Legacy project-level popup settings, superseded by widget rows
    #[sea_orm(column_type = "JsonBinary")]
    pub popup_config: Option<JsonValue>,

    /// Legacy project-level inline settings, superseded by widget rows
    #[sea_orm(column_type = "JsonBinary")]
    pub inline_config: Option<JsonValue>,

    /// Timestamp when the project was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the project was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::widget::Entity")]
    Widget,
    #[sea_orm(has_many = "super::subscriber::Entity")]
    Subscriber,
    #[sea_orm(has_many = "super::api_key::Entity")]
    ApiKey,
}

impl Related<super::widget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Widget.def()
    }
}

impl Related<super::subscriber::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriber.def()
    }
}

impl Related<super::api_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
