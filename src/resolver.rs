//! Legacy-aware widget resolution.
//!
//! Embed snippets in the wild carry three generations of id: a widget id,
//! a project id from before widgets existed, and project ids whose default
//! widget has since been deleted. Delivery tries each interpretation in
//! order. Isolated here so the chain can collapse to widget-by-id once the
//! old embeds age out.

use sea_orm::DatabaseConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{project, widget};
use crate::repositories::{ProjectRepository, WidgetRepository};

/// A fully resolved delivery target: the widget plus its owning project.
/// Activity checks happen in the handler; resolution only finds rows.
#[derive(Debug, Clone)]
pub struct ResolvedWidget {
    pub widget: widget::Model,
    pub project: project::Model,
}

/// Resolve an embed id to a widget through the fallback chain:
/// widget by id, then the project's default widget, then the project's
/// oldest widget. `Ok(None)` means the id matches nothing.
pub async fn resolve_widget(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<ResolvedWidget>, ApiError> {
    let widgets = WidgetRepository::new(db);
    let projects = ProjectRepository::new(db);

    if let Some(widget) = widgets.get_widget(id).await? {
        let Some(project) = projects.get_project(widget.project_id).await? else {
            // FK guarantees the parent row; a miss here is a torn delete
            debug!(widget_id = %id, "widget resolved but project row missing");
            return Ok(None);
        };
        return Ok(Some(ResolvedWidget { widget, project }));
    }

    // Not a widget id; treat it as a project id from a legacy embed
    let Some(project) = projects.get_project(id).await? else {
        return Ok(None);
    };

    if let Some(widget) = widgets.find_default_for_project(project.id).await? {
        debug!(project_id = %id, widget_id = %widget.id, "resolved legacy embed via default widget");
        return Ok(Some(ResolvedWidget { widget, project }));
    }

    if let Some(widget) = widgets.find_oldest_for_project(project.id).await? {
        debug!(project_id = %id, widget_id = %widget.id, "resolved legacy embed via oldest widget");
        return Ok(Some(ResolvedWidget { widget, project }));
    }

    Ok(None)
}
