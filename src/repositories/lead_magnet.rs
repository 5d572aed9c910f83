//! # Lead Magnet Repository
//!
//! This module contains the repository implementation for LeadMagnet entities.
//! A lead magnet is only reachable through the widget that references it, so
//! create-or-replace and detach-then-delete both start from the widget row.

use crate::error::ApiError;
use crate::models::lead_magnet::{
    ActiveModel as LeadMagnetActiveModel, Entity as LeadMagnet, Model as LeadMagnetModel,
};
use crate::models::widget::Model as WidgetModel;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Full replacement state for a widget's lead magnet
#[derive(Debug, Clone)]
pub struct UpsertLeadMagnetRequest {
    /// Rich-text document tree for the reveal content
    pub description: Option<JsonValue>,
    /// Short teaser shown before signup
    pub preview_text: Option<String>,
    pub is_active: bool,
}

/// Repository for LeadMagnet database operations
pub struct LeadMagnetRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeadMagnetRepository<'a> {
    /// Create a new LeadMagnetRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get lead magnet by ID
    pub async fn get_lead_magnet(&self, id: Uuid) -> Result<Option<LeadMagnetModel>, ApiError> {
        let lead_magnet = LeadMagnet::find_by_id(id).one(self.db).await?;
        Ok(lead_magnet)
    }

    /// Create the widget's lead magnet, or replace the one it already has
    pub async fn upsert_for_widget(
        &self,
        widget: WidgetModel,
        request: UpsertLeadMagnetRequest,
    ) -> Result<LeadMagnetModel, ApiError> {
        let now = Utc::now();

        if let Some(existing_id) = widget.lead_magnet_id
            && let Some(existing) = self.get_lead_magnet(existing_id).await?
        {
            let mut active = existing.into_active_model();
            active.description = Set(request.description);
            active.preview_text = Set(request.preview_text);
            active.is_active = Set(request.is_active);
            active.updated_at = Set(now.into());

            let updated = active.update(self.db).await?;
            return Ok(updated);
        }

        // Insert and attach atomically so the widget never points at a
        // row that failed to materialize
        let txn = self.db.begin().await?;

        let lead_magnet = LeadMagnetActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(request.description),
            preview_text: Set(request.preview_text),
            is_active: Set(request.is_active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let created = lead_magnet.insert(&txn).await?;

        let mut widget_active = widget.into_active_model();
        widget_active.lead_magnet_id = Set(Some(created.id));
        widget_active.updated_at = Set(now.into());
        widget_active.update(&txn).await?;

        txn.commit().await?;
        Ok(created)
    }

    /// Detach the widget's lead magnet, then delete it
    pub async fn detach_and_delete(&self, widget: WidgetModel) -> Result<(), ApiError> {
        let lead_magnet_id = widget
            .lead_magnet_id
            .ok_or_else(|| crate::error::not_found(Some("widget has no lead magnet")))?;

        let txn = self.db.begin().await?;

        let mut widget_active = widget.into_active_model();
        widget_active.lead_magnet_id = Set(None);
        widget_active.updated_at = Set(Utc::now().into());
        widget_active.update(&txn).await?;

        LeadMagnet::delete_by_id(lead_magnet_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}
