//! Widget entity model
//!
//! This module contains the SeaORM entity model for the widgets table. One
//! row holds the full capture-form configuration for both the popup and the
//! inline renditions. Nullable config fields fall back to documented
//! defaults at sanitization time, never at the schema level.

use super::project::Entity as Project;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Widget entity representing one embeddable capture form
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "widgets")]
pub struct Model {
    /// Unique identifier for the widget (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Project this widget belongs to
    pub project_id: Uuid,

    /// Internal name shown in the dashboard, never rendered to visitors
    pub name: String,

    /// Headline text
    pub title: Option<String>,

    /// Supporting copy under the headline
    pub description: Option<String>,

    /// Submit button label
    pub button_text: Option<String>,

    /// Message shown after a successful signup
    pub success_message: Option<String>,

    /// Email input placeholder
    pub placeholder: Option<String>,

    /// Accent color (buttons, focus ring)
    pub primary_color: Option<String>,

    /// Container background color
    pub background_color: Option<String>,

    /// Body text color
    pub text_color: Option<String>,

    /// Container corner radius in pixels
    pub border_radius: Option<i32>,

    /// Popup placement (center or a corner)
    pub position: Option<String>,

    /// Popup trigger kind: delay, scroll, exit-intent or click
    pub trigger_type: Option<String>,

    /// Trigger parameter: seconds for delay, percent for scroll
    pub trigger_value: Option<i32>,

    /// Inline form layout: horizontal or vertical
    pub layout: Option<String>,

    /// Lead magnet revealed after signup, if any
    pub lead_magnet_id: Option<Uuid>,

    /// Whether this widget is the project's default for legacy embeds
    pub is_default: bool,

    /// Inactive widgets serve no artifacts
    pub is_active: bool,

    /// Timestamp when the widget was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the widget was last updated
    pub updated_at: DateTimeWithTimeZone,
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
        belongs_to = "super::lead_magnet::Entity",
        from = "Column::LeadMagnetId",
        to = "super::lead_magnet::Column::Id"
    )]
    LeadMagnet,
}

impl Related<Project> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::lead_magnet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeadMagnet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
