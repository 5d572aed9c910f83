//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access with owner-aware methods.

pub mod api_key;
pub mod lead_magnet;
pub mod project;
pub mod subscriber;
pub mod widget;

pub use api_key::ApiKeyRepository;
pub use lead_magnet::{LeadMagnetRepository, UpsertLeadMagnetRequest};
pub use project::{CreateProjectRequest, ProjectRepository};
pub use subscriber::{CursorData, SubscriberRepository, UpsertOutcome, UpsertSubscriberRequest};
pub use widget::{CreateWidgetRequest, UpdateWidgetRequest, WidgetRepository};
