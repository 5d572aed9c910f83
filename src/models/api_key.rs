//! API key entity model
//!
//! This module contains the SeaORM entity model for the api_keys table.
//! The raw key exists only in the creation response; rows store its SHA-256
//! digest plus a display prefix.

use super::project::Entity as Project;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// API key entity for authenticated subscribe requests
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Unique identifier for the API key (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Project this key belongs to
    pub project_id: Uuid,

    /// SHA-256 hex digest of the raw key
    pub key_hash: String,

    /// First characters of the raw key, for dashboard display
    pub key_prefix: String,

    /// Operator-supplied label (optional)
    pub label: Option<String>,

    /// Timestamp of the last successful verification
    pub last_used_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the key was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Project",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
}

impl Related<Project> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
