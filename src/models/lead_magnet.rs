//! Lead magnet entity model
//!
//! This module contains the SeaORM entity model for the lead_magnets table.
//! The description column stores a rich-text document tree; it is rendered
//! to HTML when a referencing widget's artifact is generated.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Lead magnet entity holding post-signup reveal content
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lead_magnets")]
pub struct Model {
    /// Unique identifier for the lead magnet (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Rich-text document tree describing the reveal content
    #[sea_orm(column_type = "JsonBinary")]
    pub description: Option<JsonValue>,

    /// Short teaser shown before signup
    pub preview_text: Option<String>,

    /// Inactive lead magnets are skipped at generation time
    pub is_active: bool,

    /// Timestamp when the lead magnet was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the lead magnet was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::widget::Entity")]
    Widget,
}

impl Related<super::widget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Widget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
